//! Record/replay cassettes for the clock and directory ports.

pub mod format;
pub mod recorder;
pub mod replayer;
