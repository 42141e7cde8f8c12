//! Termination-signal handling.

use std::future::Future;

use tracing::warn;

/// Resolves with the signal name once SIGTERM or SIGINT arrives.
///
/// If the handlers cannot be installed the future never resolves, so a run
/// proceeds without signal-triggered persistence instead of aborting.
pub async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    warn!(error = %e, "could not install signal handlers");
                    return never().await;
                }
            };
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    }
    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                warn!(error = %e, "could not install ctrl-c handler");
                never().await
            }
        }
    }
}

fn never() -> impl Future<Output = &'static str> {
    std::future::pending()
}
