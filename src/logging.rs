// src/logging.rs

//! Diagnostics for the `buildlog` binary.
//!
//! Filter selection, first match wins:
//! 1. `--log-level` on the command line;
//! 2. `BUILDLOG_LOG`, read as `EnvFilter` directives (`debug`,
//!    `buildlog::exec=trace,info`, ...);
//! 3. `info`.
//!
//! Diagnostics go to stderr. The logged command's output never passes through
//! the subscriber.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_LEVEL_ENV: &str = "BUILDLOG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_LEVEL_ENV).ok();
    let filter = select_filter(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// Build the filter from the CLI level and the raw `BUILDLOG_LOG` value.
///
/// Unparseable directives fall back to the default rather than aborting the
/// run; the subscriber is not up yet, so the problem goes to stderr directly.
pub fn select_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(directive_for(level));
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("buildlog: ignoring {LOG_LEVEL_ENV}={directives:?}: {e}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVE),
    }
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
