// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildlog`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildlog",
    version,
    about = "Run a command and persist its combined output, optionally through a filter.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML). Optional.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file to write. A `.gz` suffix enables compression.
    ///
    /// Overrides `[logger].log_path` and `BUILDLOG_LOG_PATH`.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Filter command the output is piped through before it is logged.
    ///
    /// Overrides `[logger].filter_cmd` and `BUILDLOG_FILTER_CMD`. Pass an empty
    /// string to disable a configured filter.
    #[arg(long, value_name = "CMD")]
    pub filter: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDLOG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run; its stdout and stderr are logged.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
