//! Snapshot store: flat-file persistence of the bot's state.
//!
//! Three tables live side by side in the store directory:
//!
//! ```text
//! <store>/
//!   ├── original_followers.csv   username
//!   ├── original_following.csv   username
//!   └── targets.csv              username,last_activity,followed,followed_date,deleted
//! ```
//!
//! The two `original_*` tables are written once, on the first run, and only
//! read afterwards. All I/O goes through the `FileSystem` port.

mod table;

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::ports::directory::DirectoryError;
use crate::ports::filesystem::FileSystem;
use crate::registry::{Target, TargetRegistry};

/// File name of the targets table.
pub const TARGETS_FILE: &str = "targets.csv";
/// File name of the original-followers table.
pub const ORIGINAL_FOLLOWERS_FILE: &str = "original_followers.csv";
/// File name of the original-following table.
pub const ORIGINAL_FOLLOWING_FILE: &str = "original_following.csv";

const USERNAME_HEADER: [&str; 1] = ["username"];
const TARGETS_HEADER: [&str; 5] =
    ["username", "last_activity", "followed", "followed_date", "deleted"];

/// A snapshot could not be read, written, parsed or initialized.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Read {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error text.
        message: String,
    },
    /// The file could not be written.
    #[error("failed to write {}: {message}", path.display())]
    Write {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error text.
        message: String,
    },
    /// The file content is malformed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        /// The file involved.
        path: PathBuf,
        /// 1-based line number of the offending row.
        line: usize,
        /// What is wrong with the row.
        message: String,
    },
    /// The live listing needed to initialize a snapshot failed.
    #[error("failed to fetch the contents of {}: {source}", path.display())]
    Fetch {
        /// The snapshot that was being initialized.
        path: PathBuf,
        /// The directory failure.
        source: DirectoryError,
    },
}

/// Locations of the three snapshot tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    /// The targets table.
    pub targets: PathBuf,
    /// The original-followers table.
    pub original_followers: PathBuf,
    /// The original-following table.
    pub original_following: PathBuf,
}

impl SnapshotPaths {
    /// Standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            targets: dir.join(TARGETS_FILE),
            original_followers: dir.join(ORIGINAL_FOLLOWERS_FILE),
            original_following: dir.join(ORIGINAL_FOLLOWING_FILE),
        }
    }
}

/// Reads and writes snapshot tables.
///
/// The store never keeps a registry of its own: loading hands out a fresh
/// registry and saving serializes a borrowed one.
pub struct SnapshotStore<'a> {
    fs: &'a dyn FileSystem,
    paths: SnapshotPaths,
}

impl<'a> SnapshotStore<'a> {
    /// Creates a store for the snapshot files inside `dir`.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, dir: &Path) -> Self {
        Self { fs, paths: SnapshotPaths::in_dir(dir) }
    }

    /// The snapshot file locations.
    #[must_use]
    pub fn paths(&self) -> &SnapshotPaths {
        &self.paths
    }

    /// Loads the username set at `path`, or captures it once with `fetch`.
    ///
    /// When the file exists it is returned verbatim and `fetch` is never
    /// called. Otherwise `fetch` runs once and its result is written to
    /// `path` before being returned. A failed fetch writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if `fetch`
    /// fails, or if the new snapshot cannot be written.
    pub async fn load_or_init_original_set<F, Fut>(
        &self,
        path: &Path,
        fetch: F,
    ) -> Result<HashSet<String>, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>, DirectoryError>>,
    {
        if let Some(existing) = self.load_original_set(path)? {
            return Ok(existing);
        }

        let fetched = fetch()
            .await
            .map_err(|source| StoreError::Fetch { path: path.to_path_buf(), source })?;
        let set: HashSet<String> = fetched.into_iter().collect();

        let mut sorted: Vec<&String> = set.iter().collect();
        sorted.sort();
        let contents = table::render(&USERNAME_HEADER, sorted.into_iter().map(|u| vec![u.clone()]));
        self.write(path, &contents)?;
        Ok(set)
    }

    /// Loads the username set at `path` if the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_original_set(&self, path: &Path) -> Result<Option<HashSet<String>>, StoreError> {
        if !self.fs.exists(path) {
            return Ok(None);
        }
        Ok(Some(self.load_usernames(path)?.into_iter().collect()))
    }

    /// Reads the first column of a table with a `username` header.
    ///
    /// Extra columns are ignored, so a targets table is accepted too.
    /// Usernames keep file order; repeats are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, lacks the header, or has
    /// an empty username cell.
    pub fn load_usernames(&self, path: &Path) -> Result<Vec<String>, StoreError> {
        let contents = self.read(path)?;
        let rows = table::parse(&contents, USERNAME_HEADER[0]).map_err(|e| parse_error(path, e))?;

        let mut seen = HashSet::new();
        let mut usernames = Vec::new();
        for row in rows {
            let username = row.cells[0];
            if username.is_empty() {
                return Err(StoreError::Parse {
                    path: path.to_path_buf(),
                    line: row.line,
                    message: "empty username".into(),
                });
            }
            if seen.insert(username) {
                usernames.push(username.to_string());
            }
        }
        Ok(usernames)
    }

    /// Loads the targets table; a missing file is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any row is malformed.
    pub fn load_targets(&self) -> Result<TargetRegistry, StoreError> {
        let path = &self.paths.targets;
        if !self.fs.exists(path) {
            return Ok(TargetRegistry::new());
        }
        let contents = self.read(path)?;
        decode_targets(path, &contents)
    }

    /// Overwrites the targets table with every record in `registry`,
    /// tombstones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_targets(&self, registry: &TargetRegistry) -> Result<(), StoreError> {
        self.write(&self.paths.targets, &encode_targets(registry))
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        self.fs
            .read_to_string(path)
            .map_err(|e| StoreError::Read { path: path.to_path_buf(), message: e.to_string() })
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        self.fs
            .write(path, contents)
            .map_err(|e| StoreError::Write { path: path.to_path_buf(), message: e.to_string() })
    }
}

/// Renders a registry as a targets table, rows sorted by username.
#[must_use]
pub fn encode_targets(registry: &TargetRegistry) -> String {
    let mut targets: Vec<&Target> = registry.iter().collect();
    targets.sort_by(|a, b| a.username().cmp(b.username()));
    let rows = targets.into_iter().map(|t| {
        vec![
            t.username().to_string(),
            encode_epoch(t.last_activity()),
            t.is_followed().to_string(),
            encode_epoch(t.followed_date()),
            t.is_deleted().to_string(),
        ]
    });
    table::render(&TARGETS_HEADER, rows)
}

/// Parses a targets table.
///
/// Rows need at least the first four columns; a missing fifth (`deleted`)
/// column means `false`, which is how tables written before unfollowing
/// existed are read.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] naming the first bad row.
pub fn decode_targets(path: &Path, contents: &str) -> Result<TargetRegistry, StoreError> {
    let rows = table::parse(contents, TARGETS_HEADER[0]).map_err(|e| parse_error(path, e))?;
    let bad_row = |line: usize, message: String| StoreError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut targets = Vec::with_capacity(rows.len());
    for row in &rows {
        let target = decode_target_row(&row.cells).map_err(|message| bad_row(row.line, message))?;
        targets.push(target);
    }

    TargetRegistry::from_targets(targets).map_err(|e| {
        // Point at the second occurrence of the duplicate.
        let line = match &e {
            crate::registry::RegistryError::Duplicate(name) => rows
                .iter()
                .filter(|r| r.cells[0] == name.as_str())
                .nth(1)
                .map_or(0, |r| r.line),
            _ => 0,
        };
        bad_row(line, e.to_string())
    })
}

fn decode_target_row(cells: &[&str]) -> Result<Target, String> {
    let (username, last_activity, followed, followed_date, deleted) = match *cells {
        [u, la, f, fd] => (u, la, f, fd, None),
        [u, la, f, fd, d] => (u, la, f, fd, Some(d)),
        _ => return Err(format!("expected 4 or 5 columns, found {}", cells.len())),
    };

    let last_activity = decode_epoch("last_activity", last_activity)?;
    let followed = decode_bool("followed", followed)?;
    let followed_date = decode_epoch("followed_date", followed_date)?;
    let deleted = deleted.map_or(Ok(false), |d| decode_bool("deleted", d))?;

    Target::restore(username, last_activity, followed, followed_date, deleted)
        .map_err(|e| e.to_string())
}

fn decode_epoch(column: &str, cell: &str) -> Result<Option<DateTime<Utc>>, String> {
    if cell.is_empty() || cell == "0" {
        return Ok(None);
    }
    let secs: i64 = cell.parse().map_err(|_| format!("{column}: {cell:?} is not an integer"))?;
    DateTime::from_timestamp(secs, 0)
        .map(Some)
        .ok_or_else(|| format!("{column}: {secs} is out of range"))
}

fn encode_epoch(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "0".to_string(), |t| t.timestamp().to_string())
}

fn decode_bool(column: &str, cell: &str) -> Result<bool, String> {
    match cell {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("{column}: {other:?} is not true or false")),
    }
}

fn parse_error(path: &Path, e: table::TableError) -> StoreError {
    StoreError::Parse { path: path.to_path_buf(), line: e.line, message: e.message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TargetState;
    use crate::test_support::MemFs;
    use chrono::TimeZone;
    use std::cell::Cell;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn store(fs: &MemFs) -> SnapshotStore<'_> {
        SnapshotStore::new(fs, Path::new("/store"))
    }

    #[test]
    fn targets_round_trip_every_state() {
        let fs = MemFs::new();
        let store = store(&fs);

        let mut registry = TargetRegistry::new();
        registry.upsert_if_absent("alice", Some(at(1_710_000_000)));
        registry.upsert_if_absent("bob", None);
        registry.upsert_if_absent("carol", Some(at(1_710_000_100)));
        registry.mark_followed("bob", at(1_710_000_200)).unwrap();
        registry.mark_followed("carol", at(1_710_000_300)).unwrap();
        registry.mark_unfollowed("carol").unwrap();

        store.save_targets(&registry).unwrap();
        let loaded = store.load_targets().unwrap();

        assert_eq!(loaded, registry);
        assert_eq!(loaded.get("carol").unwrap().state(), TargetState::Unfollowed);
    }

    #[test]
    fn save_writes_sorted_five_column_rows() {
        let fs = MemFs::new();
        let mut registry = TargetRegistry::new();
        registry.upsert_if_absent("zed", None);
        registry.upsert_if_absent("amy", Some(at(1_700_000_000)));
        registry.mark_followed("amy", at(1_700_000_500)).unwrap();

        store(&fs).save_targets(&registry).unwrap();

        assert_eq!(
            fs.contents("/store/targets.csv").unwrap(),
            "username,last_activity,followed,followed_date,deleted\n\
             amy,1700000000,true,1700000500,false\n\
             zed,0,false,0,false\n"
        );
    }

    #[test]
    fn save_fully_overwrites_previous_contents() {
        let fs = MemFs::new();
        fs.put(
            "/store/targets.csv",
            "username,last_activity,followed,followed_date,deleted\nold,0,false,0,false\n",
        );
        store(&fs).save_targets(&TargetRegistry::new()).unwrap();
        assert_eq!(
            fs.contents("/store/targets.csv").unwrap(),
            "username,last_activity,followed,followed_date,deleted\n"
        );
    }

    #[test]
    fn missing_targets_file_is_an_empty_registry() {
        let fs = MemFs::new();
        assert!(store(&fs).load_targets().unwrap().is_empty());
    }

    #[test]
    fn legacy_four_column_rows_load_as_not_deleted() {
        let fs = MemFs::new();
        fs.put(
            "/store/targets.csv",
            "username,last_activity,followed,followed_date\n\
             alice,1700000000,true,1700000100\n\
             bob,,false,\n",
        );

        let registry = store(&fs).load_targets().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.iter().all(|t| !t.is_deleted()));
        assert_eq!(registry.get("alice").unwrap().followed_date(), Some(at(1_700_000_100)));
        assert_eq!(registry.get("bob").unwrap().last_activity(), None);
    }

    #[test]
    fn malformed_rows_fail_with_line_numbers() {
        let cases = [
            ("alice,0,yes,0,false", "followed"),
            ("alice,abc,false,0,false", "last_activity"),
            ("alice,0,true,12x,false", "followed_date"),
            ("alice,0,false,0,maybe", "deleted"),
            ("alice,0,false", "columns"),
            ("alice,0,true,0,false", "disagree"),
        ];
        for (row, expected) in cases {
            let fs = MemFs::new();
            fs.put(
                "/store/targets.csv",
                &format!(
                    "username,last_activity,followed,followed_date,deleted\n\
                     ok,0,false,0,false\n{row}\n"
                ),
            );
            match store(&fs).load_targets() {
                Err(StoreError::Parse { line, message, .. }) => {
                    assert_eq!(line, 3, "{row}");
                    assert!(message.contains(expected), "{row}: {message}");
                }
                other => panic!("{row}: expected parse error, got {other:?}"),
            }
        }
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let fs = MemFs::new();
        fs.put(
            "/store/targets.csv",
            "username,last_activity,followed,followed_date,deleted\n\
             a,0,false,0,false\n\
             a,0,false,0,false\n",
        );
        match store(&fs).load_targets() {
            Err(StoreError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn original_set_is_fetched_once_then_read_back() {
        let fs = MemFs::new();
        let store = store(&fs);
        let path = store.paths().original_following.clone();
        let calls = Cell::new(0);

        let first = store
            .load_or_init_original_set(&path, || {
                calls.set(calls.get() + 1);
                async { Ok(vec!["bob".to_string(), "alice".to_string(), "bob".to_string()]) }
            })
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(
            fs.contents("/store/original_following.csv").unwrap(),
            "username\nalice\nbob\n"
        );

        let second = store
            .load_or_init_original_set(&path, || {
                calls.set(calls.get() + 1);
                async { Ok(vec!["someone-new".to_string()]) }
            })
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_writes_nothing() {
        let fs = MemFs::new();
        let store = store(&fs);
        let path = store.paths().original_followers.clone();

        let result = store
            .load_or_init_original_set(&path, || async {
                Err(DirectoryError::Status { status: 502, message: "Bad Gateway".into() })
            })
            .await;

        assert!(matches!(result, Err(StoreError::Fetch { .. })));
        assert!(fs.contents("/store/original_followers.csv").is_none());
    }

    #[test]
    fn usernames_keep_order_and_ignore_extra_columns() {
        let fs = MemFs::new();
        fs.put(
            "/lists/unfollow.csv",
            "username,last_activity,followed,followed_date,deleted\n\
             carol,0,true,1,false\n\
             alice,0,false,0,false\n\
             carol,0,true,1,false\n",
        );
        let usernames = store(&fs).load_usernames(Path::new("/lists/unfollow.csv")).unwrap();
        assert_eq!(usernames, vec!["carol", "alice"]);
    }

    #[test]
    fn absent_original_set_is_none() {
        let fs = MemFs::new();
        let store = store(&fs);
        assert!(store.load_original_set(&store.paths().original_followers).unwrap().is_none());
    }
}
