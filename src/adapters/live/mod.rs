//! Live adapters talking to the real world.

pub mod clock;
pub mod directory;
pub mod filesystem;
pub mod pacer;

pub use clock::LiveClock;
pub use directory::GitHubDirectory;
pub use filesystem::LiveFileSystem;
pub use pacer::SleepingPacer;
