//! Pacer that never waits.

use std::time::Duration;

use crate::ports::pacer::{Pacer, PauseFuture};

/// Resolves every pause immediately. Used for replays and tests, where the
/// remote side is a recording and there is no rate limit to respect.
pub struct InstantPacer;

impl Pacer for InstantPacer {
    fn pause(&self, _duration: Duration) -> PauseFuture<'_> {
        Box::pin(std::future::ready(()))
    }
}
