//! Port traits defining external boundaries.
//!
//! Each trait is one boundary between the bot and the outside world (time,
//! disk, the remote account directory, waiting). Implementations live in
//! `src/adapters/`.

pub mod clock;
pub mod directory;
pub mod filesystem;
pub mod pacer;

pub use clock::Clock;
pub use directory::{AccountDirectory, DirectoryError, DirectoryFuture, PageRequest};
pub use filesystem::FileSystem;
pub use pacer::{Pacer, PauseFuture};
