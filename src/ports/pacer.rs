//! Pacer port for deliberate waits between remote calls.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by [`Pacer::pause`].
pub type PauseFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Waits between remote calls to stay under the service's rate limits.
///
/// Live runs sleep for real; replays and tests resolve immediately.
pub trait Pacer: Send + Sync {
    /// Waits for `duration`.
    fn pause(&self, duration: Duration) -> PauseFuture<'_>;
}
