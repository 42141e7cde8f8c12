//! Live pacer backed by the tokio timer.

use std::time::Duration;

use crate::ports::pacer::{Pacer, PauseFuture};

/// Pacer that actually sleeps.
pub struct SleepingPacer;

impl Pacer for SleepingPacer {
    fn pause(&self, duration: Duration) -> PauseFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pause_waits_at_least_the_requested_duration() {
        let started = std::time::Instant::now();
        SleepingPacer.pause(Duration::from_millis(20)).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
