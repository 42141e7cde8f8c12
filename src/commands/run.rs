//! `ghscout run` command.

use tracing::{info, warn};

use super::block_on;
use crate::bot::{Bot, RunOutcome, Stages};
use crate::cli::RunArgs;
use crate::config::{parse_queries, Config, ConfigError};
use crate::context::ServiceContext;

/// Execute the `run` command.
///
/// Configuration is validated before any adapter is built, so a missing
/// credential never reaches the network.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, state cannot be
/// loaded, or a save fails.
pub fn run(args: &RunArgs) -> Result<(), String> {
    let config = Config {
        credentials: args.account.credentials().map_err(|e| e.to_string())?,
        store_dir: args.store.path(),
        policy: args.pacing.policy().map_err(|e| e.to_string())?,
    };
    let stages = Stages { search: args.search, follow: args.follow, unfollow: args.unfollow };
    let queries = parse_queries(&args.queries);
    if stages.search && queries.is_empty() {
        return Err(ConfigError::NoQueries.to_string());
    }
    if stages == Stages::default() {
        warn!("no stage selected (--search, --follow, --unfollow); only loading state");
    }

    let ctx = ServiceContext::from_env(&config)?;
    block_on(execute(&ctx, &config, stages, &queries))?
}

async fn execute(
    ctx: &ServiceContext,
    config: &Config,
    stages: Stages,
    queries: &[String],
) -> Result<(), String> {
    let username = &config.credentials.username;
    let mut bot = Bot::load(ctx, &config.store_dir, username, config.policy.clone())
        .await
        .map_err(|e| format!("Failed to load state from {}: {e}", config.store_dir.display()))?;

    let outcome = bot
        .run(stages, queries)
        .await
        .map_err(|e| format!("Run aborted: {e}"))?;

    let summary = bot.registry().summary();
    match outcome {
        RunOutcome::Completed(_) => info!(
            discovered = summary.discovered,
            following = summary.following,
            unfollowed = summary.unfollowed,
            "run complete"
        ),
        RunOutcome::Interrupted { signal } => {
            info!(signal, targets = summary.total(), "run interrupted; targets saved");
        }
    }
    Ok(())
}
