//! Recording adapter for the `Clock` port.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use super::record_interaction;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::Clock;

/// Records clock readings while delegating to an inner implementation.
pub struct RecordingClock {
    inner: Box<dyn Clock>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingClock {
    /// Creates a new recording clock wrapping the given implementation.
    pub fn new(inner: Box<dyn Clock>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> DateTime<Utc> {
        let result = self.inner.now();
        record_interaction(&self.recorder, "clock", "now", &(), &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::clock::LiveClock;

    #[test]
    fn records_now_interaction() {
        let path = std::env::temp_dir().join("ghscout_rec_clock.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "test", "octocat")));

        let clock = RecordingClock::new(Box::new(LiveClock), Arc::clone(&recorder));
        let _ = clock.now();

        let guard = recorder.lock().unwrap();
        assert_eq!(guard.len(), 1);
        drop(guard);

        let written = recorder.lock().unwrap().save().unwrap().to_path_buf();
        let content = std::fs::read_to_string(&written).unwrap();
        assert!(content.contains("clock"));
        assert!(content.contains("now"));

        let _ = std::fs::remove_file(&written);
    }
}
