//! `ghscout unfollow-file` command.

use std::path::Path;

use tracing::info;

use super::block_on;
use crate::cli::{AccountArgs, PacingArgs, StoreArgs};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::reconcile::unfollow_listed;
use crate::store::SnapshotStore;

/// Execute the `unfollow-file` command.
///
/// Unfollows each username in `file` without consulting the targets table.
/// Accounts in an existing original-following snapshot are skipped.
///
/// # Errors
///
/// Returns an error string if configuration is invalid or the file or the
/// snapshot cannot be read.
pub fn run(
    file: &Path,
    account: &AccountArgs,
    store: &StoreArgs,
    pacing: &PacingArgs,
) -> Result<(), String> {
    let config = Config {
        credentials: account.credentials().map_err(|e| e.to_string())?,
        store_dir: store.path(),
        policy: pacing.policy().map_err(|e| e.to_string())?,
    };
    let ctx = ServiceContext::from_env(&config)?;
    let snapshots = SnapshotStore::new(&*ctx.fs, &config.store_dir);

    let usernames = snapshots.load_usernames(file).map_err(|e| e.to_string())?;
    let protected = snapshots
        .load_original_set(&snapshots.paths().original_following)
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    info!(
        file = %file.display(),
        listed = usernames.len(),
        protected = protected.len(),
        "unfollowing listed accounts"
    );

    let report = block_on(unfollow_listed(&ctx, &config.policy, &usernames, &protected))?;
    println!(
        "Unfollowed {} of {} listed account(s); {} failed, {} skipped.",
        report.succeeded,
        usernames.len(),
        report.failed,
        report.skipped
    );
    Ok(())
}
