//! `ghscout status` command.

use std::fmt::Write as _;
use std::path::Path;

use crate::adapters::live::LiveFileSystem;
use crate::cli::StoreArgs;
use crate::ports::FileSystem;
use crate::registry::Target;
use crate::store::SnapshotStore;

/// Execute the `status` command.
///
/// Reads the snapshot store only; no credentials are needed.
///
/// # Errors
///
/// Returns an error string if a snapshot exists but cannot be parsed.
pub fn run(store: &StoreArgs, list: bool) -> Result<(), String> {
    print!("{}", render(&LiveFileSystem, &store.path(), list)?);
    Ok(())
}

/// Renders the status report for the store at `dir`.
///
/// # Errors
///
/// Returns an error string if a snapshot exists but cannot be parsed.
pub fn render(fs: &dyn FileSystem, dir: &Path, list: bool) -> Result<String, String> {
    let store = SnapshotStore::new(fs, dir);
    let registry = store.load_targets().map_err(|e| e.to_string())?;
    let followers =
        store.load_original_set(&store.paths().original_followers).map_err(|e| e.to_string())?;
    let following =
        store.load_original_set(&store.paths().original_following).map_err(|e| e.to_string())?;

    let mut out = String::new();
    let size = |set: Option<std::collections::HashSet<String>>| {
        set.map_or_else(|| "not captured".to_string(), |s| s.len().to_string())
    };
    let _ = writeln!(out, "Store: {}", dir.display());
    let _ = writeln!(out, "Original followers: {}", size(followers));
    let _ = writeln!(out, "Original following: {}", size(following));

    if registry.is_empty() {
        let _ = writeln!(out, "No targets found in store.");
        return Ok(out);
    }

    let summary = registry.summary();
    let _ = writeln!(
        out,
        "Targets: {} (discovered {}, following {}, unfollowed {})",
        summary.total(),
        summary.discovered,
        summary.following,
        summary.unfollowed
    );

    if list {
        let mut targets: Vec<&Target> = registry.iter().collect();
        targets.sort_by(|a, b| a.username().cmp(b.username()));
        write_table(&mut out, &targets);
    }
    Ok(out)
}

fn write_table(out: &mut String, targets: &[&Target]) {
    let stamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
    };
    let rows: Vec<(String, &str, String, String)> = targets
        .iter()
        .map(|t| {
            let name = t.username().to_string();
            (name, t.state().label(), stamp(t.last_activity()), stamp(t.followed_date()))
        })
        .collect();

    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(8).max(8);
    let state_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(5).max(5);
    let active_width = rows.iter().map(|r| r.2.len()).max().unwrap_or(13).max(13);

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<state_width$}  {:<active_width$}  FOLLOWED",
        "USERNAME", "STATE", "LAST ACTIVITY",
    );
    let _ = writeln!(
        out,
        "{:-<name_width$}  {:-<state_width$}  {:-<active_width$}  {:-<8}",
        "", "", "", "",
    );
    for (name, state, active, followed) in &rows {
        let _ = writeln!(
            out,
            "{name:<name_width$}  {state:<state_width$}  {active:<active_width$}  {followed}"
        );
    }
}
