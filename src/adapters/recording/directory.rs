//! Recording adapter for the `AccountDirectory` port.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{AccountDirectory, DirectoryFuture, PageRequest};

/// Port name used in cassettes for directory traffic.
pub(crate) const PORT: &str = "directory";

#[derive(Serialize)]
pub(crate) struct SearchInput<'a> {
    pub(crate) query: &'a str,
    pub(crate) page: u32,
    pub(crate) per_page: u32,
}

#[derive(Serialize)]
pub(crate) struct ListInput<'a> {
    pub(crate) username: &'a str,
    pub(crate) page: u32,
    pub(crate) per_page: u32,
}

#[derive(Serialize)]
pub(crate) struct ActivityInput<'a> {
    pub(crate) username: &'a str,
    pub(crate) count: u32,
}

#[derive(Serialize)]
pub(crate) struct AccountInput<'a> {
    pub(crate) username: &'a str,
}

/// Records directory calls while delegating to an inner implementation.
pub struct RecordingDirectory {
    inner: Box<dyn AccountDirectory>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingDirectory {
    /// Creates a new recording directory wrapping the given implementation.
    pub fn new(inner: Box<dyn AccountDirectory>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl AccountDirectory for RecordingDirectory {
    fn search_accounts(&self, query: &str, page: PageRequest) -> DirectoryFuture<'_, Vec<String>> {
        let query = query.to_string();
        Box::pin(async move {
            let result = self.inner.search_accounts(&query, page).await;
            let input = SearchInput { query: &query, page: page.page, per_page: page.per_page };
            record_result(&self.recorder, PORT, "search_accounts", &input, &result);
            result
        })
    }

    fn list_followers(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        let username = username.to_string();
        Box::pin(async move {
            let result = self.inner.list_followers(&username, page).await;
            let input = ListInput { username: &username, page: page.page, per_page: page.per_page };
            record_result(&self.recorder, PORT, "list_followers", &input, &result);
            result
        })
    }

    fn list_following(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        let username = username.to_string();
        Box::pin(async move {
            let result = self.inner.list_following(&username, page).await;
            let input = ListInput { username: &username, page: page.page, per_page: page.per_page };
            record_result(&self.recorder, PORT, "list_following", &input, &result);
            result
        })
    }

    fn recent_activity(
        &self,
        username: &str,
        count: u32,
    ) -> DirectoryFuture<'_, Vec<DateTime<Utc>>> {
        let username = username.to_string();
        Box::pin(async move {
            let result = self.inner.recent_activity(&username, count).await;
            let input = ActivityInput { username: &username, count };
            record_result(&self.recorder, PORT, "recent_activity", &input, &result);
            result
        })
    }

    fn follow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let username = username.to_string();
        Box::pin(async move {
            let result = self.inner.follow(&username).await;
            let input = AccountInput { username: &username };
            record_result(&self.recorder, PORT, "follow", &input, &result);
            result
        })
    }

    fn unfollow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let username = username.to_string();
        Box::pin(async move {
            let result = self.inner.unfollow(&username).await;
            record_result(
                &self.recorder,
                PORT,
                "unfollow",
                &AccountInput { username: &username },
                &result,
            );
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::DirectoryError;
    use crate::test_support::FakeDirectory;

    #[tokio::test]
    async fn records_results_and_errors_with_their_inputs() {
        let fake = FakeDirectory::new();
        fake.fail_unfollow(
            "bob",
            DirectoryError::Status { status: 404, message: "Not Found".into() },
        );
        let path = std::env::temp_dir().join("ghscout_rec_directory.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "test", "octocat")));
        let directory = RecordingDirectory::new(Box::new(fake.clone()), Arc::clone(&recorder));

        directory.follow("alice").await.unwrap();
        assert!(directory.unfollow("bob").await.is_err());

        let saved = recorder.lock().unwrap().save().unwrap().to_path_buf();
        let cassette: crate::cassette::format::Cassette =
            serde_yaml::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();

        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].method, "follow");
        assert_eq!(cassette.interactions[0].input, serde_json::json!({"username": "alice"}));
        assert_eq!(
            cassette.interactions[1].output,
            serde_json::json!({"Err": {"Status": {"status": 404, "message": "Not Found"}}})
        );
        assert_eq!(fake.calls(), vec!["follow:alice", "unfollow:bob"]);

        let _ = std::fs::remove_file(&saved);
    }
}
