//! Account directory port: the remote follow graph.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure of a remote directory call.
///
/// Every variant is distinct from an empty result: "no accounts found" is
/// `Ok(vec![])`, never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum DirectoryError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message reported by the service, or the canonical reason.
        message: String,
    },
    /// The service answered successfully but the body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Boxed future type alias used by [`AccountDirectory`] to keep the trait dyn-compatible.
pub type DirectoryFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, DirectoryError>> + Send + 'a>>;

/// One page of a paginated listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The 1-based page number.
    pub page: u32,
    /// Maximum number of entries on the page.
    pub per_page: u32,
}

/// Read and write access to the platform's accounts and follow graph.
///
/// Listing operations are page-granular; callers own the pagination loop so
/// they can decide how to handle a failure halfway through.
pub trait AccountDirectory: Send + Sync {
    /// Searches accounts matching `query`, returning one page of usernames.
    fn search_accounts(&self, query: &str, page: PageRequest) -> DirectoryFuture<'_, Vec<String>>;

    /// Lists one page of the accounts following `username`.
    fn list_followers(&self, username: &str, page: PageRequest)
        -> DirectoryFuture<'_, Vec<String>>;

    /// Lists one page of the accounts `username` follows.
    fn list_following(&self, username: &str, page: PageRequest)
        -> DirectoryFuture<'_, Vec<String>>;

    /// Returns the timestamps of the `count` most recent public events
    /// performed by `username`, most recent first.
    fn recent_activity(
        &self,
        username: &str,
        count: u32,
    ) -> DirectoryFuture<'_, Vec<DateTime<Utc>>>;

    /// Follows `username` as the authenticated account.
    fn follow(&self, username: &str) -> DirectoryFuture<'_, ()>;

    /// Unfollows `username` as the authenticated account.
    fn unfollow(&self, username: &str) -> DirectoryFuture<'_, ()>;
}
