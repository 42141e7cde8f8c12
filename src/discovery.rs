//! Discovery stage: turn search results into active follow candidates.
//!
//! Each query's results are paged in, filtered against what the bot already
//! knows, and checked for recent activity. Checks for one query run as a
//! bounded set of concurrent futures; their results are gathered before any
//! of them touches the registry, so all registry writes stay on the caller.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Policy;
use crate::context::ServiceContext;
use crate::paginate::collect_pages;
use crate::ports::DirectoryError;
use crate::registry::TargetRegistry;

/// How far back both of the latest events must reach for an account to count
/// as active.
pub const ACTIVITY_WINDOW_HOURS: i64 = 48;

/// Number of recent events an active account must have inside the window.
pub const MIN_RECENT_EVENTS: u32 = 2;

/// Counters for one discovery stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Queries searched.
    pub queries: usize,
    /// Distinct accounts returned by all searches.
    pub candidates: usize,
    /// Candidates already present in the registry.
    pub skipped_known: usize,
    /// Candidates the account already followed before the bot ever ran.
    pub skipped_protected: usize,
    /// Activity checks that completed.
    pub checked: usize,
    /// Candidates found active and added to the registry.
    pub discovered: usize,
    /// Activity checks that failed.
    pub failed: usize,
    /// Queries whose pagination ended on an error.
    pub search_errors: usize,
}

/// Decides whether an event history shows an active account.
///
/// Returns the most recent event time when at least [`MIN_RECENT_EVENTS`]
/// events exist and the latest two are both strictly newer than
/// `now - ACTIVITY_WINDOW_HOURS`.
#[must_use]
pub fn classify_activity(events: &[DateTime<Utc>], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if events.len() < MIN_RECENT_EVENTS as usize {
        return None;
    }
    let mut latest = events.to_vec();
    latest.sort_unstable_by(|a, b| b.cmp(a));

    let window_start = now - Duration::hours(ACTIVITY_WINDOW_HOURS);
    let recent = latest.iter().take(MIN_RECENT_EVENTS as usize).all(|at| *at > window_start);
    recent.then(|| latest[0])
}

/// Runs discovery for every query and adds active candidates to `registry`.
///
/// Search failures and failed activity checks are logged and skipped; the
/// stage itself never fails.
pub async fn discover(
    ctx: &ServiceContext,
    policy: &Policy,
    queries: &[String],
    registry: &mut TargetRegistry,
    original_following: &HashSet<String>,
) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    for query in queries {
        report.queries += 1;
        let outcome = collect_pages(policy.per_page, Some(policy.max_search_pages), move |page| {
            ctx.directory.search_accounts(query, page)
        })
        .await;
        if let Some(error) = &outcome.error {
            report.search_errors += 1;
            warn!(
                query = %query,
                pages = outcome.pages_fetched,
                error = %error,
                "search stopped early"
            );
        }

        let mut fresh = Vec::new();
        for username in outcome.items {
            if !seen.insert(username.clone()) {
                continue;
            }
            report.candidates += 1;
            if original_following.contains(&username) {
                report.skipped_protected += 1;
            } else if registry.contains(&username) {
                report.skipped_known += 1;
            } else {
                fresh.push(username);
            }
        }
        debug!(query = %query, candidates = fresh.len(), "checking activity");

        let now = ctx.clock.now();
        let results = check_all(ctx, policy, &fresh).await;
        for (username, result) in results {
            match result {
                Ok(events) => {
                    report.checked += 1;
                    if let Some(last_activity) = classify_activity(&events, now) {
                        if registry.upsert_if_absent(username, Some(last_activity)) {
                            report.discovered += 1;
                            info!(
                                username = %username,
                                query = %query,
                                "discovered active account"
                            );
                        }
                    }
                }
                Err(error) => {
                    report.failed += 1;
                    warn!(username = %username, error = %error, "activity check failed");
                }
            }
        }
    }

    info!(
        queries = report.queries,
        candidates = report.candidates,
        checked = report.checked,
        discovered = report.discovered,
        failed = report.failed,
        "discovery finished"
    );
    report
}

async fn check_all<'a>(
    ctx: &ServiceContext,
    policy: &Policy,
    usernames: &'a [String],
) -> Vec<(&'a str, Result<Vec<DateTime<Utc>>, DirectoryError>)> {
    let checks = usernames.iter().map(move |username| async move {
        ctx.pacer.pause(policy.discovery_delay).await;
        let result = ctx.directory.recent_activity(username, MIN_RECENT_EVENTS).await;
        (username.as_str(), result)
    });
    stream::iter(checks).buffer_unordered(policy.discovery_concurrency).collect().await
}
