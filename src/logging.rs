//! Tracing subscriber setup for the binary.

use std::env;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable that switches log lines to JSON.
pub const LOG_JSON_ENV: &str = "GHSCOUT_LOG_JSON";

/// Installs the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// The filter comes from `RUST_LOG` (default `info`). Calling this twice is
/// harmless; the second call is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if env_flag(LOG_JSON_ENV) {
        let layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(layer).try_init().ok();
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        registry.with(layer).try_init().ok();
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "YES")
}

#[cfg(test)]
mod tests {
    use super::{init, parse_flag};

    #[test]
    fn flag_accepts_common_truthy_spellings() {
        for v in ["1", "true", "TRUE", "yes", " YES "] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["", "0", "false", "no", "on"] {
            assert!(!parse_flag(v), "{v}");
        }
    }

    #[test]
    fn second_init_is_ignored() {
        init();
        init();
        tracing::info!("still logging");
    }
}
