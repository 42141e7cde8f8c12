//! Port implementations.
//!
//! - `live`: GitHub over HTTPS, the system clock, real disk, real sleeps.
//! - `recording`: wraps live adapters and captures traffic into a cassette.
//! - `replaying`: answers from a cassette without touching the network.

pub mod live;
pub mod recording;
pub mod replaying;
