//! Command dispatch and handlers.

pub mod run;
pub mod status;
pub mod unfollow_file;

use std::future::Future;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// Network commands pick their adapters from the environment:
/// `GHSCOUT_REPLAY=<file>` serves directory traffic from a cassette and
/// `GHSCOUT_RECORD=<file>` captures it into one.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Run(args) => run::run(args),
        Command::UnfollowFile { file, account, store, pacing } => {
            unfollow_file::run(file, account, store, pacing)
        }
        Command::Status { store, list } => status::run(store, *list),
    }
}

/// Drives `future` to completion on a fresh single-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    Ok(runtime.block_on(future))
}
