// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Library side of the `crash` binary: logging setup, the file-level
//! commands and the interactive console.

pub mod commands;
pub mod console;

use tracing_subscriber::{EnvFilter, fmt};

/// Filter for the batch commands.
pub const DEFAULT_FILTER: &str = "info,crash_resolve=info,crash_runtime=info";

/// Filter for the console, where per-run logs would interleave with rows.
pub const CONSOLE_FILTER: &str = "warn";

/// Install the global tracing subscriber. Logs go to stderr.
///
/// `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
