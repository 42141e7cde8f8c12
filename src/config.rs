//! Run configuration: credentials, store location and pacing policy.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

/// A configuration problem detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No access token was supplied.
    #[error("GITHUB_ACCESS_TOKEN is required (or pass --token)")]
    MissingToken,
    /// No acting username was supplied.
    #[error("GITHUB_USERNAME is required (or pass --username)")]
    MissingUsername,
    /// Discovery was requested without any search query.
    #[error("--search needs at least one query (set GHSCOUT_QUERIES or pass --queries)")]
    NoQueries,
    /// The random delay range is inverted.
    #[error("minimum delay {min}s exceeds maximum delay {max}s")]
    InvalidDelayRange {
        /// Lower bound in seconds.
        min: u64,
        /// Upper bound in seconds.
        max: u64,
    },
    /// A count that must be positive was zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    /// The page size is above what the API will return in one page.
    #[error("page size {0} exceeds the API maximum of 100")]
    PerPageTooLarge(u32),
}

/// Largest page GitHub serves for searches and follower listings. A larger
/// request is silently clamped, which would make a full page look short.
pub const MAX_PER_PAGE: u32 = 100;

/// Inclusive range of whole seconds to wait after each follow or unfollow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min_secs: u64,
    max_secs: u64,
}

impl DelayRange {
    /// Creates a range, rejecting `min_secs > max_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelayRange`] when the bounds are inverted.
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self, ConfigError> {
        if min_secs > max_secs {
            return Err(ConfigError::InvalidDelayRange { min: min_secs, max: max_secs });
        }
        Ok(Self { min_secs, max_secs })
    }

    /// Lower bound in seconds.
    #[must_use]
    pub fn min_secs(&self) -> u64 {
        self.min_secs
    }

    /// Upper bound in seconds.
    #[must_use]
    pub fn max_secs(&self) -> u64 {
        self.max_secs
    }

    /// Picks a uniformly random whole-second duration within the range.
    #[must_use]
    pub fn sample(&self) -> Duration {
        Duration::from_secs(rand::thread_rng().gen_range(self.min_secs..=self.max_secs))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self { min_secs: 1, max_secs: 6 }
    }
}

/// Tunables that shape how hard the bot leans on the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Maximum number of search result pages fetched per query.
    pub max_search_pages: u32,
    /// Page size for search and follower/following listings.
    pub per_page: u32,
    /// Random wait after each successful follow or unfollow.
    pub action_delay: DelayRange,
    /// Fixed wait each discovery worker observes before its activity check.
    pub discovery_delay: Duration,
    /// Maximum number of activity checks in flight at once.
    pub discovery_concurrency: usize,
    /// Per-request timeout of the HTTP client.
    pub http_timeout: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_search_pages: 4,
            per_page: 100,
            action_delay: DelayRange::default(),
            discovery_delay: Duration::from_secs(1),
            discovery_concurrency: 8,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Policy {
    /// Checks the counts that must be positive and the page size cap.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] naming the offending setting, or
    /// [`ConfigError::PerPageTooLarge`] above [`MAX_PER_PAGE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_search_pages == 0 {
            return Err(ConfigError::Zero("search page limit"));
        }
        if self.per_page == 0 {
            return Err(ConfigError::Zero("page size"));
        }
        if self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::PerPageTooLarge(self.per_page));
        }
        if self.discovery_concurrency == 0 {
            return Err(ConfigError::Zero("discovery concurrency"));
        }
        Ok(())
    }
}

/// The account the bot acts as.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Personal access token with the `user:follow` scope.
    pub token: String,
    /// Login of the authenticated account.
    pub username: String,
}

impl Credentials {
    /// Builds credentials from optional raw values; blank counts as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] or [`ConfigError::MissingUsername`].
    pub fn resolve(token: Option<&str>, username: Option<&str>) -> Result<Self, ConfigError> {
        let token =
            token.map(str::trim).filter(|t| !t.is_empty()).ok_or(ConfigError::MissingToken)?;
        let username =
            username.map(str::trim).filter(|u| !u.is_empty()).ok_or(ConfigError::MissingUsername)?;
        Ok(Self { token: token.to_string(), username: username.to_string() })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

/// Everything a network command needs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Who the bot acts as.
    pub credentials: Credentials,
    /// Directory holding the snapshot files.
    pub store_dir: PathBuf,
    /// Pacing and pagination policy.
    pub policy: Policy,
}

/// Splits, trims and de-duplicates search queries, dropping empty ones.
#[must_use]
pub fn parse_queries<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut queries: Vec<String> = Vec::new();
    for query in raw.iter().flat_map(|q| q.as_ref().split(',')).map(str::trim) {
        if !query.is_empty() && !queries.iter().any(|q| q == query) {
            queries.push(query.to_string());
        }
    }
    queries
}

/// Expands a leading `~` to the current user's home directory.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with(path, home_dir().as_deref())
}

/// Expands a leading `~` against an explicit home directory.
///
/// Paths without a leading `~`, and every path when `home` is unknown, are
/// returned unchanged.
#[must_use]
pub fn expand_tilde_with(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_range_rejects_inverted_bounds() {
        assert_eq!(DelayRange::new(7, 2), Err(ConfigError::InvalidDelayRange { min: 7, max: 2 }));
    }

    #[test]
    fn delay_samples_stay_within_bounds() {
        let range = DelayRange::new(1, 6).unwrap();
        for _ in 0..200 {
            let secs = range.sample().as_secs();
            assert!((1..=6).contains(&secs), "sampled {secs}");
        }
    }

    #[test]
    fn degenerate_delay_range_is_fixed() {
        assert_eq!(DelayRange::new(0, 0).unwrap().sample(), Duration::ZERO);
    }

    #[test]
    fn blank_credentials_are_missing() {
        assert_eq!(Credentials::resolve(Some("  "), Some("me")), Err(ConfigError::MissingToken));
        assert_eq!(Credentials::resolve(Some("t"), None), Err(ConfigError::MissingUsername));
        let creds = Credentials::resolve(Some(" t "), Some(" me ")).unwrap();
        assert_eq!(creds.token, "t");
        assert_eq!(creds.username, "me");
    }

    #[test]
    fn debug_output_hides_token() {
        let creds = Credentials::resolve(Some("ghp_secret"), Some("me")).unwrap();
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("ghp_secret"));
        assert!(rendered.contains("me"));
    }

    #[test]
    fn queries_are_split_trimmed_and_deduplicated() {
        let queries = parse_queries(&["rust, ethereum", " ", "rust", "golang,,"]);
        assert_eq!(queries, vec!["rust", "ethereum", "golang"]);
    }

    #[test]
    fn tilde_expands_against_home() {
        let home = Path::new("/home/octo");
        assert_eq!(
            expand_tilde_with("~/.ghscout", Some(home)),
            PathBuf::from("/home/octo/.ghscout")
        );
        assert_eq!(expand_tilde_with("~", Some(home)), PathBuf::from("/home/octo"));
        assert_eq!(expand_tilde_with("/var/lib/x", Some(home)), PathBuf::from("/var/lib/x"));
        assert_eq!(expand_tilde_with("~other/x", Some(home)), PathBuf::from("~other/x"));
        assert_eq!(expand_tilde_with("~/x", None), PathBuf::from("~/x"));
    }

    #[test]
    fn default_policy_is_valid_and_zero_counts_are_not() {
        assert!(Policy::default().validate().is_ok());
        let policy = Policy { discovery_concurrency: 0, ..Policy::default() };
        assert_eq!(policy.validate(), Err(ConfigError::Zero("discovery concurrency")));
    }

    #[test]
    fn page_size_above_the_api_maximum_is_rejected() {
        let policy = Policy { per_page: MAX_PER_PAGE, ..Policy::default() };
        assert!(policy.validate().is_ok());
        let policy = Policy { per_page: 150, ..Policy::default() };
        assert_eq!(policy.validate(), Err(ConfigError::PerPageTooLarge(150)));
    }
}
