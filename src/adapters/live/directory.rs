//! Live adapter for the `AccountDirectory` port using the GitHub REST API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::ports::directory::{AccountDirectory, DirectoryError, DirectoryFuture, PageRequest};

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("ghscout/", env!("CARGO_PKG_VERSION"));

/// Account directory backed by `api.github.com`.
pub struct GitHubDirectory {
    client: Client,
    token: String,
    base_url: String,
}

/// The subset of a GitHub user object the bot reads.
#[derive(Deserialize)]
struct Account {
    login: String,
}

/// Response body of `GET /search/users`.
#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<Account>,
}

/// The subset of a GitHub event object the bot reads.
#[derive(Deserialize)]
struct Event {
    created_at: DateTime<Utc>,
}

/// Error body returned by the GitHub API.
#[derive(Deserialize)]
struct GitHubErrorBody {
    message: String,
}

impl GitHubDirectory {
    /// Creates a client authenticating with `token`; every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be constructed
    /// (for example when no TLS backend is available).
    pub fn new(token: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DirectoryError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, token: token.to_string(), base_url: GITHUB_API_URL.to_string() })
    }

    /// Points the client at another API root (GitHub Enterprise, local mocks).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DirectoryError> {
        let response =
            request.send().await.map_err(|e| DirectoryError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorBody>(&body).map_or_else(
            |_| status.canonical_reason().unwrap_or("unknown status").to_string(),
            |e| e.message,
        );
        Err(DirectoryError::Status { status: status.as_u16(), message })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DirectoryError> {
        let response = self.send(self.request(Method::GET, path).query(query)).await?;
        response.json::<T>().await.map_err(|e| DirectoryError::Decode(e.to_string()))
    }

    async fn list_logins(
        &self,
        path: &str,
        page: PageRequest,
    ) -> Result<Vec<String>, DirectoryError> {
        let accounts: Vec<Account> = self.get_json(path, &page_query(page)).await?;
        Ok(accounts.into_iter().map(|a| a.login).collect())
    }

    async fn put_or_delete(&self, method: Method, username: &str) -> Result<(), DirectoryError> {
        // GitHub rejects a follow PUT without an explicit zero Content-Length.
        let request = self.request(method, &format!("/user/following/{username}")).body("");
        self.send(request).await.map(|_| ())
    }
}

fn page_query(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![("page", page.page.to_string()), ("per_page", page.per_page.to_string())]
}

impl AccountDirectory for GitHubDirectory {
    fn search_accounts(&self, query: &str, page: PageRequest) -> DirectoryFuture<'_, Vec<String>> {
        let query = query.to_string();
        Box::pin(async move {
            let mut params = page_query(page);
            params.push(("q", query));
            let response: SearchResponse = self.get_json("/search/users", &params).await?;
            Ok(response.items.into_iter().map(|a| a.login).collect())
        })
    }

    fn list_followers(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        let path = format!("/users/{username}/followers");
        Box::pin(async move { self.list_logins(&path, page).await })
    }

    fn list_following(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        let path = format!("/users/{username}/following");
        Box::pin(async move { self.list_logins(&path, page).await })
    }

    fn recent_activity(
        &self,
        username: &str,
        count: u32,
    ) -> DirectoryFuture<'_, Vec<DateTime<Utc>>> {
        let path = format!("/users/{username}/events");
        Box::pin(async move {
            let query = page_query(PageRequest { page: 1, per_page: count });
            let events: Vec<Event> = self.get_json(&path, &query).await?;
            Ok(events.into_iter().map(|e| e.created_at).collect())
        })
    }

    fn follow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let username = username.to_string();
        Box::pin(async move { self.put_or_delete(Method::PUT, &username).await })
    }

    fn unfollow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let username = username.to_string();
        Box::pin(async move { self.put_or_delete(Method::DELETE, &username).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let directory = GitHubDirectory::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/api/");
        assert_eq!(directory.base_url, "http://127.0.0.1:9/api");
    }

    #[test]
    fn search_response_decodes_logins() {
        let body = r#"{"total_count": 2, "incomplete_results": false,
            "items": [{"login": "alice", "id": 1}, {"login": "bob", "id": 2}]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        let logins: Vec<String> = response.items.into_iter().map(|a| a.login).collect();
        assert_eq!(logins, vec!["alice", "bob"]);
    }

    #[test]
    fn event_decodes_created_at() {
        let body = r#"[{"id": "1", "type": "PushEvent", "created_at": "2025-03-15T10:00:00Z"}]"#;
        let events: Vec<Event> = serde_json::from_str(body).unwrap();
        assert_eq!(events[0].created_at.to_rfc3339(), "2025-03-15T10:00:00+00:00");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 (discard) on loopback is closed on test machines.
        let directory = GitHubDirectory::new("token", Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = directory.follow("alice").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Transport(_)), "got {err:?}");
    }
}
