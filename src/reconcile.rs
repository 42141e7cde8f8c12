//! Follow and unfollow reconciliation.
//!
//! Eligibility is decided from registry state alone; the passes then walk
//! the eligible targets one at a time, pausing a random interval after each
//! successful action. A failed action is logged and the pass moves on.

use std::collections::HashSet;

use tracing::{error, info, warn};

use crate::config::Policy;
use crate::context::ServiceContext;
use crate::registry::{RegistryError, TargetRegistry};

/// Counters for one follow or unfollow pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Actions attempted.
    pub attempted: usize,
    /// Actions the remote service accepted.
    pub succeeded: usize,
    /// Actions that failed and were skipped.
    pub failed: usize,
    /// Eligible usernames deliberately left alone.
    pub skipped: usize,
}

/// Targets that have never been followed, sorted by username.
#[must_use]
pub fn follow_candidates(registry: &TargetRegistry) -> Vec<String> {
    let mut names: Vec<String> = registry
        .iter()
        .filter(|t| !t.is_followed())
        .map(|t| t.username().to_string())
        .collect();
    names.sort();
    names
}

/// Targets the bot followed and may now unfollow, sorted by username.
///
/// Accounts in `original_following` are never returned, whatever their
/// registry state.
#[must_use]
pub fn unfollow_candidates(
    registry: &TargetRegistry,
    original_following: &HashSet<String>,
) -> Vec<String> {
    let mut names: Vec<String> = registry
        .iter()
        .filter(|t| t.is_followed() && !t.is_deleted())
        .filter(|t| !original_following.contains(t.username()))
        .map(|t| t.username().to_string())
        .collect();
    names.sort();
    names
}

/// Follows every never-followed target.
///
/// # Errors
///
/// Returns a [`RegistryError`] only if the registry rejects a state change
/// for a target it just reported as eligible.
pub async fn follow_pass(
    ctx: &ServiceContext,
    policy: &Policy,
    registry: &mut TargetRegistry,
) -> Result<PassReport, RegistryError> {
    let mut report = PassReport::default();
    for username in follow_candidates(registry) {
        report.attempted += 1;
        match ctx.directory.follow(&username).await {
            Ok(()) => {
                registry.mark_followed(&username, ctx.clock.now())?;
                report.succeeded += 1;
                info!(username = %username, "followed");
                ctx.pacer.pause(policy.action_delay.sample()).await;
            }
            Err(e) => {
                report.failed += 1;
                error!(username = %username, error = %e, "follow failed");
            }
        }
    }
    info!(
        attempted = report.attempted,
        followed = report.succeeded,
        failed = report.failed,
        "follow pass finished"
    );
    Ok(report)
}

/// Unfollows every followed, non-protected, not-yet-unfollowed target.
///
/// # Errors
///
/// Returns a [`RegistryError`] only if the registry rejects a state change
/// for a target it just reported as eligible.
pub async fn unfollow_pass(
    ctx: &ServiceContext,
    policy: &Policy,
    registry: &mut TargetRegistry,
    original_following: &HashSet<String>,
) -> Result<PassReport, RegistryError> {
    let mut report = PassReport::default();
    for username in unfollow_candidates(registry, original_following) {
        report.attempted += 1;
        match ctx.directory.unfollow(&username).await {
            Ok(()) => {
                registry.mark_unfollowed(&username)?;
                report.succeeded += 1;
                info!(username = %username, "unfollowed");
                ctx.pacer.pause(policy.action_delay.sample()).await;
            }
            Err(e) => {
                report.failed += 1;
                error!(username = %username, error = %e, "unfollow failed");
            }
        }
    }
    info!(
        attempted = report.attempted,
        unfollowed = report.succeeded,
        failed = report.failed,
        "unfollow pass finished"
    );
    Ok(report)
}

/// Unfollows each listed username, bypassing the registry.
///
/// Usernames in `protected` are skipped.
pub async fn unfollow_listed(
    ctx: &ServiceContext,
    policy: &Policy,
    usernames: &[String],
    protected: &HashSet<String>,
) -> PassReport {
    let mut report = PassReport::default();
    for username in usernames {
        if protected.contains(username) {
            report.skipped += 1;
            warn!(username = %username, "skipping account followed before the bot ran");
            continue;
        }
        report.attempted += 1;
        match ctx.directory.unfollow(username).await {
            Ok(()) => {
                report.succeeded += 1;
                info!(username = %username, "unfollowed");
                ctx.pacer.pause(policy.action_delay.sample()).await;
            }
            Err(e) => {
                report.failed += 1;
                error!(username = %username, error = %e, "unfollow failed");
            }
        }
    }
    info!(
        attempted = report.attempted,
        unfollowed = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        "unfollow list finished"
    );
    report
}
