//! Replaying adapters that answer from a recorded cassette.

pub mod clock;
pub mod directory;
pub mod pacer;

pub use clock::ReplayingClock;
pub use directory::ReplayingDirectory;
pub use pacer::InstantPacer;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cassette::replayer::CassetteReplayer;

/// Take the next recorded output for a port/method, in recording order.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_interaction(port, method).output
}

/// Take the recorded output whose input matches `input`.
pub(crate) fn matching_output<I: Serialize>(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
    input: &I,
) -> serde_json::Value {
    let input = serde_json::to_value(input).expect("failed to serialize replay input");
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_matching(port, method, &input).output
}

/// Decode a `{"Ok": v}` / `{"Err": e}` output written by `recording::record_result`.
///
/// # Panics
///
/// Panics if the output has neither shape or does not decode into `T` / `E`;
/// a malformed cassette is a broken fixture, not a runtime condition.
pub(crate) fn replay_result<T, E>(output: serde_json::Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    if let Some(err) = output.get("Err") {
        let err = serde_json::from_value(err.clone()).expect("cassette Err value has wrong shape");
        return Err(err);
    }
    let value =
        output.get("Ok").cloned().expect("cassette output must be {\"Ok\": ..} or {\"Err\": ..}");
    Ok(serde_json::from_value(value).expect("cassette Ok value has wrong shape"))
}
