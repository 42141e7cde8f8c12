//! In-memory fakes for the ports, shared by unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::MAX_PER_PAGE;
use crate::context::ServiceContext;
use crate::ports::{
    AccountDirectory, Clock, DirectoryError, DirectoryFuture, FileSystem, PageRequest, Pacer,
    PauseFuture,
};

/// Parses an RFC 3339 timestamp.
pub(crate) fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp).unwrap().with_timezone(&Utc)
}

/// Builds a context over the given fakes; the returned handle sees every pause.
pub(crate) fn test_context(
    directory: &FakeDirectory,
    fs: &MemFs,
    now: DateTime<Utc>,
) -> (ServiceContext, NoPause) {
    let pacer = NoPause::default();
    let ctx = ServiceContext::from_parts(
        Box::new(FixedClock(now)),
        Box::new(fs.clone()),
        Box::new(directory.clone()),
        Box::new(pacer.clone()),
    );
    (ctx, pacer)
}

/// A clock frozen at one instant.
pub(crate) struct FixedClock(pub(crate) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A pacer that returns immediately and remembers what it was asked to wait.
#[derive(Clone, Default)]
pub(crate) struct NoPause {
    taken: Arc<Mutex<Vec<Duration>>>,
}

impl NoPause {
    pub(crate) fn taken(&self) -> Vec<Duration> {
        self.taken.lock().unwrap().clone()
    }
}

impl Pacer for NoPause {
    fn pause(&self, duration: Duration) -> PauseFuture<'_> {
        self.taken.lock().unwrap().push(duration);
        Box::pin(std::future::ready(()))
    }
}

/// A filesystem held in a map. Clones share the same files.
#[derive(Clone, Default)]
pub(crate) struct MemFs {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl MemFs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(&self, path: &str, contents: &str) {
        self.files.lock().unwrap().insert(PathBuf::from(path), contents.to_string());
    }

    pub(crate) fn contents(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

impl FileSystem for MemFs {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| format!("{}: no such file", path.display()).into())
    }

    fn write(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

#[derive(Default)]
struct FakeState {
    search: HashMap<String, Vec<String>>,
    followers: Vec<String>,
    following: Vec<String>,
    activity: HashMap<String, Vec<DateTime<Utc>>>,
    failures: HashMap<String, DirectoryError>,
    calls: Vec<String>,
}

/// A scripted account directory. Clones share state, so a test can keep a
/// handle after boxing one into a context.
///
/// Every call is logged as `method:argument` (listing calls add `:page`).
/// Follower and following listings answer the same lists for any username.
#[derive(Clone, Default)]
pub(crate) struct FakeDirectory {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_search(&self, query: &str, usernames: &[&str]) {
        self.state.lock().unwrap().search.insert(query.into(), owned(usernames));
    }

    pub(crate) fn set_followers(&self, usernames: &[&str]) {
        self.state.lock().unwrap().followers = owned(usernames);
    }

    pub(crate) fn set_following(&self, usernames: &[&str]) {
        self.state.lock().unwrap().following = owned(usernames);
    }

    pub(crate) fn set_activity(&self, username: &str, events: &[&str]) {
        let events = events.iter().map(|e| at(e)).collect();
        self.state.lock().unwrap().activity.insert(username.into(), events);
    }

    pub(crate) fn fail_search(&self, query: &str, page: u32, error: DirectoryError) {
        self.fail(format!("search:{query}:{page}"), error);
    }

    pub(crate) fn fail_followers(&self, error: DirectoryError) {
        self.fail("followers".into(), error);
    }

    pub(crate) fn fail_activity(&self, username: &str, error: DirectoryError) {
        self.fail(format!("activity:{username}"), error);
    }

    pub(crate) fn fail_follow(&self, username: &str, error: DirectoryError) {
        self.fail(format!("follow:{username}"), error);
    }

    pub(crate) fn fail_unfollow(&self, username: &str, error: DirectoryError) {
        self.fail(format!("unfollow:{username}"), error);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn fail(&self, key: String, error: DirectoryError) {
        self.state.lock().unwrap().failures.insert(key, error);
    }

    fn answer<T: Send + 'static>(
        &self,
        call: String,
        failure_key: &str,
        ok: impl FnOnce(&FakeState) -> T,
    ) -> DirectoryFuture<'_, T> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        let result = match state.failures.get(failure_key) {
            Some(e) => Err(e.clone()),
            None => Ok(ok(&state)),
        };
        Box::pin(std::future::ready(result))
    }
}

fn owned(usernames: &[&str]) -> Vec<String> {
    usernames.iter().map(|u| (*u).to_string()).collect()
}

/// Slices one page, clamping the size the way GitHub does.
fn page_of(all: &[String], page: PageRequest) -> Vec<String> {
    let per_page = page.per_page.min(MAX_PER_PAGE) as usize;
    all.iter().skip((page.page as usize - 1) * per_page).take(per_page).cloned().collect()
}

impl AccountDirectory for FakeDirectory {
    fn search_accounts(&self, query: &str, page: PageRequest) -> DirectoryFuture<'_, Vec<String>> {
        let call = format!("search:{query}:{}", page.page);
        let query = query.to_string();
        self.answer(call.clone(), &call, move |s| {
            s.search.get(&query).map(|all| page_of(all, page)).unwrap_or_default()
        })
    }

    fn list_followers(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        self.answer(format!("followers:{username}:{}", page.page), "followers", move |s| {
            page_of(&s.followers, page)
        })
    }

    fn list_following(
        &self,
        username: &str,
        page: PageRequest,
    ) -> DirectoryFuture<'_, Vec<String>> {
        self.answer(format!("following:{username}:{}", page.page), "following", move |s| {
            page_of(&s.following, page)
        })
    }

    fn recent_activity(
        &self,
        username: &str,
        count: u32,
    ) -> DirectoryFuture<'_, Vec<DateTime<Utc>>> {
        let call = format!("activity:{username}");
        let username = username.to_string();
        self.answer(call.clone(), &call, move |s| {
            let mut events = s.activity.get(&username).cloned().unwrap_or_default();
            events.sort_unstable_by(|a, b| b.cmp(a));
            events.truncate(count as usize);
            events
        })
    }

    fn follow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let call = format!("follow:{username}");
        self.answer(call.clone(), &call, |_| ())
    }

    fn unfollow(&self, username: &str) -> DirectoryFuture<'_, ()> {
        let call = format!("unfollow:{username}");
        self.answer(call.clone(), &call, |_| ())
    }
}
