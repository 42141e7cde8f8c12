//! Replaying adapter for the `AccountDirectory` port.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::{matching_output, replay_result};
use crate::adapters::recording::directory::{
    AccountInput, ActivityInput, ListInput, SearchInput, PORT,
};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{AccountDirectory, DirectoryError, DirectoryFuture, PageRequest};

/// Serves recorded directory answers from a cassette.
///
/// Every call is matched on its arguments, so a replay tolerates the
/// nondeterministic order of concurrent activity checks.
pub struct ReplayingDirectory {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingDirectory {
    /// Create a replaying directory sharing the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }

    fn answer<T, I>(&self, method: &str, input: &I) -> Result<T, DirectoryError>
    where
        T: serde::de::DeserializeOwned,
        I: serde::Serialize,
    {
        replay_result(matching_output(&self.replayer, PORT, method, input))
    }
}

impl AccountDirectory for ReplayingDirectory {
    fn search_accounts(&self, query: &str, page: PageRequest) -> DirectoryFuture<'_, Vec<String>> {
        let input = SearchInput { query, page: page.page, per_page: page.per_page };
        let result = self.answer("search_accounts", &input);
        Box::pin(std::future::ready(result))
    }

    fn list_followers(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        let input = ListInput { username, page: page.page, per_page: page.per_page };
        let result = self.answer("list_followers", &input);
        Box::pin(std::future::ready(result))
    }

    fn list_following(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        let input = ListInput { username, page: page.page, per_page: page.per_page };
        let result = self.answer("list_following", &input);
        Box::pin(std::future::ready(result))
    }

    fn recent_activity(
        &self,
        username: &str,
        count: u32,
    ) -> DirectoryFuture<'_, Vec<DateTime<Utc>>> {
        let result = self.answer("recent_activity", &ActivityInput { username, count });
        Box::pin(std::future::ready(result))
    }

    fn follow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let result = self.answer("follow", &AccountInput { username });
        Box::pin(std::future::ready(result))
    }

    fn unfollow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let result = self.answer("unfollow", &AccountInput { username });
        Box::pin(std::future::ready(result))
    }
}
