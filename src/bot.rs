//! The bot: owns the registry and the original snapshots and drives the
//! stages over the injected ports.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;

use tracing::{info, warn};

use crate::config::Policy;
use crate::context::ServiceContext;
use crate::discovery::{discover, DiscoveryReport};
use crate::paginate::collect_pages;
use crate::reconcile::{follow_pass, unfollow_pass, PassReport};
use crate::registry::{RegistryError, TargetRegistry};
use crate::shutdown;
use crate::store::{SnapshotStore, StoreError};

/// Failure that stops a run.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Loading or saving a snapshot failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The registry refused a state change.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Which stages a run performs, always in this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Stages {
    /// Search for and record new active accounts.
    pub search: bool,
    /// Follow every never-followed target.
    pub follow: bool,
    /// Unfollow every target the bot followed.
    pub unfollow: bool,
}

/// What a completed or interrupted run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Discovery counters, when the stage ran.
    pub discovery: Option<DiscoveryReport>,
    /// Follow counters, when the stage ran.
    pub follow: Option<PassReport>,
    /// Unfollow counters, when the stage ran.
    pub unfollow: Option<PassReport>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every requested stage finished.
    Completed(RunReport),
    /// A termination signal arrived; the registry was saved once.
    Interrupted {
        /// Name of the signal received.
        signal: &'static str,
    },
}

/// A loaded bot, ready to run stages.
pub struct Bot<'a> {
    ctx: &'a ServiceContext,
    store: SnapshotStore<'a>,
    policy: Policy,
    registry: TargetRegistry,
    original_followers: HashSet<String>,
    original_following: HashSet<String>,
}

impl<'a> Bot<'a> {
    /// Loads state from `store_dir`, capturing the original follower and
    /// following sets on the first run.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot cannot be read, parsed, fetched or
    /// written.
    pub async fn load(
        ctx: &'a ServiceContext,
        store_dir: &Path,
        username: &str,
        policy: Policy,
    ) -> Result<Self, BotError> {
        let store = SnapshotStore::new(&*ctx.fs, store_dir);
        let per_page = policy.per_page;

        let followers_path = store.paths().original_followers.clone();
        let original_followers = store
            .load_or_init_original_set(&followers_path, move || async move {
                info!(username, "capturing original followers");
                collect_pages(per_page, None, move |page| {
                    ctx.directory.list_followers(username, page)
                })
                .await
                .into_result()
            })
            .await?;

        let following_path = store.paths().original_following.clone();
        let original_following = store
            .load_or_init_original_set(&following_path, move || async move {
                info!(username, "capturing original following");
                collect_pages(per_page, None, move |page| {
                    ctx.directory.list_following(username, page)
                })
                .await
                .into_result()
            })
            .await?;

        let registry = store.load_targets()?;
        let summary = registry.summary();
        info!(
            followers = original_followers.len(),
            following = original_following.len(),
            discovered = summary.discovered,
            followed = summary.following,
            unfollowed = summary.unfollowed,
            "state loaded"
        );

        Ok(Self {
            ctx,
            store,
            policy,
            registry,
            original_followers,
            original_following,
        })
    }

    /// Current targets.
    #[must_use]
    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Accounts that followed the acting account before the first run.
    #[must_use]
    pub fn original_followers(&self) -> &HashSet<String> {
        &self.original_followers
    }

    /// Accounts the acting account followed before the first run.
    #[must_use]
    pub fn original_following(&self) -> &HashSet<String> {
        &self.original_following
    }

    /// Writes the registry to the targets table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be written.
    pub fn persist(&self) -> Result<(), StoreError> {
        self.store.save_targets(&self.registry)
    }

    /// Runs `stages` until they finish or a termination signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if a save fails, including the save triggered by a
    /// signal.
    pub async fn run(
        &mut self,
        stages: Stages,
        queries: &[String],
    ) -> Result<RunOutcome, BotError> {
        self.run_until(stages, queries, shutdown::wait_for_signal()).await
    }

    /// Runs `stages` until they finish or `shutdown` resolves.
    ///
    /// The registry is saved after each stage. When `shutdown` wins, the
    /// stage in flight is dropped and the registry is saved exactly once
    /// more.
    ///
    /// # Errors
    ///
    /// Returns an error if any save fails or the registry rejects a change.
    pub async fn run_until<S>(
        &mut self,
        stages: Stages,
        queries: &[String],
        shutdown: S,
    ) -> Result<RunOutcome, BotError>
    where
        S: Future<Output = &'static str>,
    {
        let signal = {
            let work = std::pin::pin!(self.run_stages(stages, queries));
            tokio::select! {
                biased;
                result = work => return result.map(RunOutcome::Completed),
                signal = shutdown => signal,
            }
        };

        warn!(signal, "termination requested; saving targets");
        self.persist()?;
        Ok(RunOutcome::Interrupted { signal })
    }

    async fn run_stages(
        &mut self,
        stages: Stages,
        queries: &[String],
    ) -> Result<RunReport, BotError> {
        let mut report = RunReport::default();

        if stages.search {
            let discovery = discover(
                self.ctx,
                &self.policy,
                queries,
                &mut self.registry,
                &self.original_following,
            )
            .await;
            report.discovery = Some(discovery);
            self.persist()?;
        }

        if stages.follow {
            report.follow = Some(follow_pass(self.ctx, &self.policy, &mut self.registry).await?);
            self.persist()?;
        }

        if stages.unfollow {
            report.unfollow = Some(
                unfollow_pass(self.ctx, &self.policy, &mut self.registry, &self.original_following)
                    .await?,
            );
            self.persist()?;
        }

        Ok(report)
    }
}
