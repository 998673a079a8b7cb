// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logger;
pub mod logging;
pub mod task_state;
pub mod types;
pub mod writer;

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{FilterCommand, apply_env_overrides, load_and_validate};

pub use crate::config::BuildLoggerConfig;
pub use crate::logger::{BuildLogger, CancelHandle, ProducerHandle};
pub use crate::task_state::TaskState;
pub use crate::types::TaskOutcome;

/// Exit code reported when the command was interrupted with Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, environment, CLI flags)
/// - the log pipeline
/// - the command whose output is logged
/// - Ctrl-C handling
///
/// Returns the exit code to report: the command's own exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&config, &args.command);
        return Ok(0);
    }

    let Some((program, program_args)) = args.command.split_first() else {
        bail!("no command given; pass it after `--`");
    };

    let mut logger = BuildLogger::new(config);
    logger.start().await.context("starting log pipeline")?;

    let stdin = logger
        .stdin()
        .context("log pipeline has no producer handle")?;

    let mut child = Command::new(program)
        .args(program_args)
        .stdin(Stdio::null())
        .stdout(stdin.try_clone_stdio()?)
        .stderr(stdin.try_clone_stdio()?)
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("spawning command '{program}'"))?;

    // The command holds its own copies; ours would keep the pipe open forever.
    logger.close_stdin();
    info!(command = %program, pid = child.id(), "command started");

    let code = tokio::select! {
        status = child.wait() => {
            let status = status.with_context(|| format!("waiting for command '{program}'"))?;
            let code = status.code().unwrap_or(1);
            info!(command = %program, exit_code = code, "command exited");
            code
        }

        res = tokio::signal::ctrl_c() => {
            res.context("listening for Ctrl+C")?;
            warn!("interrupted; cancelling log pipeline");
            logger.cancel();
            if let Err(e) = child.kill().await {
                debug!(error = %e, "command already exited while interrupting");
            }
            INTERRUPTED_EXIT_CODE
        }
    };

    let outcome = logger.wait().await;
    info!(?outcome, "log pipeline finished");

    Ok(code)
}

/// Merge the config file, the environment, and CLI flags (highest priority).
pub fn resolve_config(args: &CliArgs) -> Result<BuildLoggerConfig> {
    let base = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BuildLoggerConfig::new(),
    };

    let mut config = apply_env_overrides(base)?;

    if let Some(path) = &args.log_file {
        config.log_path = Some(path.clone());
    }
    if let Some(raw) = &args.filter {
        config.filter = FilterCommand::parse(raw)?;
    }

    Ok(config)
}

/// Simple dry-run output: print the resolved pipeline.
fn print_dry_run(config: &BuildLoggerConfig, command: &[String]) {
    println!("buildlog dry-run");
    match &config.log_path {
        Some(path) => println!("  log_path: {}", path.display()),
        None => println!("  log_path: (none, output discarded)"),
    }
    match &config.filter {
        Some(filter) if config.log_path.is_some() => println!("  filter: {filter}"),
        Some(filter) => println!("  filter: {filter} (ignored without log_path)"),
        None => println!("  filter: (none)"),
    }
    if let Some(env) = &config.environment {
        println!("  filter env ({} vars):", env.len());
        for (key, value) in env {
            println!("    {key}={value}");
        }
    }
    if !command.is_empty() {
        println!("  command: {command:?}");
    }

    debug!("dry-run complete (no execution)");
}
