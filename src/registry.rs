//! Target registry: every account the bot has discovered, keyed by username.
//!
//! A target only moves forward through its lifecycle:
//!
//! ```text
//! discovered ──follow──▶ following ──unfollow──▶ unfollowed (tombstone)
//! ```
//!
//! Records are never removed, so a tombstone keeps an account from being
//! followed a second time on a later run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// A lifecycle rule was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The username is not in the registry.
    #[error("unknown target {0}")]
    UnknownTarget(String),
    /// The target was already followed.
    #[error("target {0} is already followed")]
    AlreadyFollowed(String),
    /// The target was never followed by the bot, so it cannot be unfollowed.
    #[error("target {0} was never followed")]
    NotFollowed(String),
    /// The target was already unfollowed.
    #[error("target {0} is already unfollowed")]
    AlreadyUnfollowed(String),
    /// A restored record breaks a lifecycle invariant.
    #[error("inconsistent record for {username}: {reason}")]
    Inconsistent {
        /// The offending username.
        username: String,
        /// Which invariant is broken.
        reason: &'static str,
    },
    /// The same username appeared twice while restoring.
    #[error("duplicate target {0}")]
    Duplicate(String),
}

/// Where a target is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// Discovered but not followed yet.
    Discovered,
    /// Followed by the bot and not unfollowed.
    Following,
    /// Followed by the bot and later unfollowed.
    Unfollowed,
}

impl TargetState {
    /// Lower-case label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Following => "following",
            Self::Unfollowed => "unfollowed",
        }
    }
}

/// One tracked account.
///
/// Fields are private so that only [`TargetRegistry`] can move a target
/// through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    username: String,
    last_activity: Option<DateTime<Utc>>,
    followed: bool,
    followed_date: Option<DateTime<Utc>>,
    deleted: bool,
}

impl Target {
    fn discovered(username: &str, last_activity: Option<DateTime<Utc>>) -> Self {
        Self {
            username: username.to_string(),
            last_activity,
            followed: false,
            followed_date: None,
            deleted: false,
        }
    }

    /// Rebuilds a target from persisted fields, checking the invariants.
    ///
    /// `followed_date` stands in for the `followed` flag: a record is
    /// followed exactly when it has a follow date.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Inconsistent`] if `followed` and
    /// `followed_date` disagree, or if the record is deleted without having
    /// been followed.
    pub fn restore(
        username: &str,
        last_activity: Option<DateTime<Utc>>,
        followed: bool,
        followed_date: Option<DateTime<Utc>>,
        deleted: bool,
    ) -> Result<Self, RegistryError> {
        let inconsistent =
            |reason| RegistryError::Inconsistent { username: username.to_string(), reason };
        if username.is_empty() {
            return Err(inconsistent("empty username"));
        }
        if followed != followed_date.is_some() {
            return Err(inconsistent("followed flag and followed date disagree"));
        }
        if deleted && !followed {
            return Err(inconsistent("unfollowed without having been followed"));
        }
        Ok(Self { username: username.to_string(), last_activity, followed, followed_date, deleted })
    }

    /// The account login.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Most recent activity observed at discovery time.
    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_activity
    }

    /// Whether the bot has followed this account.
    #[must_use]
    pub fn is_followed(&self) -> bool {
        self.followed
    }

    /// When the bot followed this account.
    #[must_use]
    pub fn followed_date(&self) -> Option<DateTime<Utc>> {
        self.followed_date
    }

    /// Whether the bot has unfollowed this account after following it.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Lifecycle position derived from the flags.
    #[must_use]
    pub fn state(&self) -> TargetState {
        match (self.followed, self.deleted) {
            (false, _) => TargetState::Discovered,
            (true, false) => TargetState::Following,
            (true, true) => TargetState::Unfollowed,
        }
    }
}

/// Counts of targets per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrySummary {
    /// Discovered, not yet followed.
    pub discovered: usize,
    /// Currently followed by the bot.
    pub following: usize,
    /// Followed and later unfollowed.
    pub unfollowed: usize,
}

impl RegistrySummary {
    /// Total number of targets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.discovered + self.following + self.unfollowed
    }
}

/// Sole owner of all target records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRegistry {
    targets: HashMap<String, Target>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from restored targets.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if a username occurs twice.
    pub fn from_targets(targets: impl IntoIterator<Item = Target>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for target in targets {
            if registry.targets.contains_key(&target.username) {
                return Err(RegistryError::Duplicate(target.username));
            }
            registry.targets.insert(target.username.clone(), target);
        }
        Ok(registry)
    }

    /// Inserts a freshly discovered target unless the username is already known.
    ///
    /// Returns `true` if a record was inserted. An existing record is never
    /// touched, whatever its state.
    pub fn upsert_if_absent(
        &mut self,
        username: &str,
        last_activity: Option<DateTime<Utc>>,
    ) -> bool {
        if self.targets.contains_key(username) {
            return false;
        }
        self.targets.insert(username.to_string(), Target::discovered(username, last_activity));
        true
    }

    /// Records a successful follow.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTarget`] or [`RegistryError::AlreadyFollowed`].
    pub fn mark_followed(
        &mut self,
        username: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RegistryError> {
        let target = self
            .targets
            .get_mut(username)
            .ok_or_else(|| RegistryError::UnknownTarget(username.to_string()))?;
        if target.followed {
            return Err(RegistryError::AlreadyFollowed(username.to_string()));
        }
        target.followed = true;
        target.followed_date = Some(at);
        Ok(())
    }

    /// Records a successful unfollow, turning the target into a tombstone.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownTarget`], [`RegistryError::NotFollowed`]
    /// or [`RegistryError::AlreadyUnfollowed`].
    pub fn mark_unfollowed(&mut self, username: &str) -> Result<(), RegistryError> {
        let target = self
            .targets
            .get_mut(username)
            .ok_or_else(|| RegistryError::UnknownTarget(username.to_string()))?;
        if !target.followed {
            return Err(RegistryError::NotFollowed(username.to_string()));
        }
        if target.deleted {
            return Err(RegistryError::AlreadyUnfollowed(username.to_string()));
        }
        target.deleted = true;
        Ok(())
    }

    /// Looks up a target.
    #[must_use]
    pub fn get(&self, username: &str) -> Option<&Target> {
        self.targets.get(username)
    }

    /// Returns `true` if the username is tracked.
    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.targets.contains_key(username)
    }

    /// Iterates over all targets in unspecified order. The borrow keeps the
    /// registry unchanged until the iterator is dropped.
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    /// Number of tracked targets, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Counts targets per lifecycle state.
    #[must_use]
    pub fn summary(&self) -> RegistrySummary {
        let mut summary = RegistrySummary::default();
        for target in self.targets.values() {
            match target.state() {
                TargetState::Discovered => summary.discovered += 1,
                TargetState::Following => summary.following += 1,
                TargetState::Unfollowed => summary.unfollowed += 1,
            }
        }
        summary
    }
}
