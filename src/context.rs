//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::adapters::live::{GitHubDirectory, LiveClock, LiveFileSystem, SleepingPacer};
use crate::adapters::recording::{RecordingClock, RecordingDirectory};
use crate::adapters::replaying::{InstantPacer, ReplayingClock, ReplayingDirectory};
use crate::cassette::format::Cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::Config;
use crate::ports::{AccountDirectory, Clock, FileSystem, Pacer};

/// Environment variable naming a cassette to record into.
pub const RECORD_ENV: &str = "GHSCOUT_RECORD";
/// Environment variable naming a cassette to replay from.
pub const REPLAY_ENV: &str = "GHSCOUT_REPLAY";

/// Bundles all port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live,
/// recording, replaying); everything downstream only sees the ports.
pub struct ServiceContext {
    /// Clock for obtaining the current time.
    pub clock: Box<dyn Clock>,
    /// Filesystem for snapshot I/O.
    pub fs: Box<dyn FileSystem>,
    /// The remote account directory.
    pub directory: Box<dyn AccountDirectory>,
    /// Waits between throttled actions.
    pub pacer: Box<dyn Pacer>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Assembles a context from explicit adapters.
    #[must_use]
    pub fn from_parts(
        clock: Box<dyn Clock>,
        fs: Box<dyn FileSystem>,
        directory: Box<dyn AccountDirectory>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self { clock, fs, directory, pacer, recorder: None }
    }

    /// Creates a live context talking to GitHub.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn live(config: &Config) -> Result<Self, String> {
        let directory = live_directory(config)?;
        Ok(Self::from_parts(
            Box::new(LiveClock),
            Box::new(LiveFileSystem),
            Box::new(directory),
            Box::new(SleepingPacer),
        ))
    }

    /// Creates a live context that records directory and clock traffic into
    /// a cassette at `path`. The cassette is written when the context drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn recording(config: &Config, path: &Path) -> Result<Self, String> {
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            "ghscout-session",
            config.credentials.username.clone(),
        )));
        let directory = live_directory(config)?;
        let mut ctx = Self::from_parts(
            Box::new(RecordingClock::new(Box::new(LiveClock), Arc::clone(&recorder))),
            Box::new(LiveFileSystem),
            Box::new(RecordingDirectory::new(Box::new(directory), Arc::clone(&recorder))),
            Box::new(SleepingPacer),
        );
        ctx.recorder = Some(recorder);
        Ok(ctx)
    }

    /// Creates a context whose directory and clock answer from a cassette.
    ///
    /// Pauses return immediately and snapshots use the real filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
        let cassette: Cassette = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;

        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        Ok(Self::from_parts(
            Box::new(ReplayingClock::new(Arc::clone(&replayer))),
            Box::new(LiveFileSystem),
            Box::new(ReplayingDirectory::new(replayer)),
            Box::new(InstantPacer),
        ))
    }

    /// Picks the adapters from the environment: `GHSCOUT_REPLAY` wins over
    /// `GHSCOUT_RECORD`, and with neither set the context is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected context cannot be built.
    pub fn from_env(config: &Config) -> Result<Self, String> {
        if let Some(path) = std::env::var_os(REPLAY_ENV).filter(|p| !p.is_empty()) {
            info!(cassette = %Path::new(&path).display(), "replaying directory traffic");
            return Self::replaying(Path::new(&path));
        }
        if let Some(path) = std::env::var_os(RECORD_ENV).filter(|p| !p.is_empty()) {
            info!(cassette = %Path::new(&path).display(), "recording directory traffic");
            return Self::recording(config, Path::new(&path));
        }
        Self::live(config)
    }
}

fn live_directory(config: &Config) -> Result<GitHubDirectory, String> {
    GitHubDirectory::new(&config.credentials.token, config.policy.http_timeout)
        .map_err(|e| format!("Failed to create GitHub client: {e}"))
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        let Some(recorder) = self.recorder.take() else {
            return;
        };
        let Ok(guard) = recorder.lock() else {
            warn!("cassette recorder lock poisoned; recording discarded");
            return;
        };
        match guard.save() {
            Ok(path) => {
                info!(cassette = %path.display(), interactions = guard.len(), "recording saved");
            }
            Err(e) => warn!(error = %e, "failed to write cassette"),
        }
    }
}
