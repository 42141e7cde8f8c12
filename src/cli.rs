//! CLI argument definitions.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{expand_tilde, ConfigError, Credentials, DelayRange, Policy};

/// Top-level CLI parser for `ghscout`.
#[derive(Debug, Parser)]
#[command(
    name = "ghscout",
    version,
    about = "Find active GitHub accounts, follow them, and unfollow them later"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load state, then run the selected stages in order: search, follow, unfollow.
    Run(RunArgs),
    /// Unfollow every username listed in a CSV file (first column, header row).
    UnfollowFile {
        /// CSV file whose first column holds usernames.
        file: PathBuf,
        /// Account credentials.
        #[command(flatten)]
        account: AccountArgs,
        /// Snapshot location.
        #[command(flatten)]
        store: StoreArgs,
        /// Pacing policy.
        #[command(flatten)]
        pacing: PacingArgs,
    },
    /// Summarize the snapshot store without touching the network.
    Status {
        /// Snapshot location.
        #[command(flatten)]
        store: StoreArgs,
        /// Print one line per target.
        #[arg(long)]
        list: bool,
    },
}

/// Arguments of the `run` command.
#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Search for active accounts and add them as targets.
    #[arg(long)]
    pub search: bool,
    /// Follow every target not yet followed.
    #[arg(long)]
    pub follow: bool,
    /// Unfollow every followed target (accounts followed before the first run are kept).
    #[arg(long)]
    pub unfollow: bool,
    /// Comma-separated search queries.
    #[arg(long, env = "GHSCOUT_QUERIES", value_delimiter = ',')]
    pub queries: Vec<String>,
    /// Account credentials.
    #[command(flatten)]
    pub account: AccountArgs,
    /// Snapshot location.
    #[command(flatten)]
    pub store: StoreArgs,
    /// Pacing policy.
    #[command(flatten)]
    pub pacing: PacingArgs,
}

/// Who the bot acts as.
#[derive(Debug, Args)]
pub struct AccountArgs {
    /// Personal access token.
    #[arg(long, env = "GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Login of the account the token belongs to.
    #[arg(long, env = "GITHUB_USERNAME")]
    pub username: Option<String>,
}

impl AccountArgs {
    /// Validated credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or username is missing or blank.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Credentials::resolve(self.token.as_deref(), self.username.as_deref())
    }
}

/// Where snapshot files live.
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Directory holding the snapshot files; `~/` expands to the home directory.
    #[arg(long = "store", env = "GHSCOUT_STORE", default_value = ".")]
    pub dir: String,
}

impl StoreArgs {
    /// The store directory with `~` expanded.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        expand_tilde(&self.dir)
    }
}

/// Knobs for how hard the bot leans on the API.
#[derive(Debug, Args)]
pub struct PacingArgs {
    /// Shortest wait after a follow or unfollow, in seconds.
    #[arg(long, default_value_t = 1)]
    pub min_delay: u64,
    /// Longest wait after a follow or unfollow, in seconds.
    #[arg(long, default_value_t = 6)]
    pub max_delay: u64,
    /// Search result pages fetched per query.
    #[arg(long, default_value_t = 4)]
    pub search_pages: u32,
    /// Page size for searches and listings (at most 100).
    #[arg(long, default_value_t = 100)]
    pub per_page: u32,
    /// Activity checks in flight at once.
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,
    /// Wait before each activity check, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub discovery_delay_ms: u64,
    /// HTTP request timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl PacingArgs {
    /// Validated policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the delay range is inverted, a count is zero, or
    /// the page size is above the API maximum.
    pub fn policy(&self) -> Result<Policy, ConfigError> {
        let policy = Policy {
            max_search_pages: self.search_pages,
            per_page: self.per_page,
            action_delay: DelayRange::new(self.min_delay, self.max_delay)?,
            discovery_delay: Duration::from_millis(self.discovery_delay_ms),
            discovery_concurrency: self.concurrency,
            http_timeout: Duration::from_secs(self.timeout),
        };
        policy.validate()?;
        Ok(policy)
    }
}
