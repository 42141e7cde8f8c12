//! Core library for the `ghscout` CLI: discover active GitHub accounts,
//! follow them, and later unfollow them, keeping state in flat snapshot
//! files.

pub mod adapters;
pub mod bot;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod discovery;
pub mod logging;
pub mod paginate;
pub mod ports;
pub mod reconcile;
pub mod registry;
pub mod shutdown;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// `--help` and `--version` print to stdout and succeed.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli.command)
}
