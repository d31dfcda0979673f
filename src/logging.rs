//! Tracing subscriber setup.
//!
//! `RUST_LOG` always wins. Without it, verbosity maps to a level for this
//! crate: quiet is `error`, then `warn`, `info`, `debug`, `trace` for each
//! additional `-v`.

use crate::error::{Result, SelectError};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Level used for this crate when `RUST_LOG` is unset.
#[must_use]
pub const fn default_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn env_filter(verbose: u8, quiet: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "example_filter={}",
            default_level(verbose, quiet)
        ))
    })
}

/// Install the global subscriber.
///
/// Logs go to stderr, or as JSON lines appended to `log_file` when given.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = env_filter(verbose, quiet);

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .json()
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
    };

    installed.map_err(|err| SelectError::Logging(err.to_string()))
}

/// Install a subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("example_filter=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
