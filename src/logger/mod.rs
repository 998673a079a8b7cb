// src/logger/mod.rs

//! Pipeline coordinator.
//!
//! [`BuildLogger`] owns the producer-facing write end of the pipeline, wires
//! it (optionally through a filter command) into a [`LogWriter`], and
//! supervises both children until they finish or the pipeline is cancelled.
//!
//! Topology with a usable filter:
//!
//! ```text
//! producer -> [stdin] -> filter stdin | filter stdout+stderr -> [log_input] -> writer
//! ```
//!
//! Without a filter, or when the filter command cannot be spawned:
//!
//! ```text
//! producer -> [stdin] -> [log_input] -> writer
//! ```

use std::io::{self, PipeReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::anyhow;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::BuildLoggerConfig;
use crate::errors::{BuildLogError, Result};
use crate::exec::{FilterProcess, SupervisorExit, cancel_children, supervise};
use crate::task_state::TaskState;
use crate::types::TaskOutcome;
use crate::writer::{LogWriter, LogWriterFactory, PipeLoggerFactory};

pub mod producer;

pub use producer::ProducerHandle;

/// State shared with the supervisor's exit observer and cancel handles.
#[derive(Debug)]
struct Shared {
    stdin: OnceLock<ProducerHandle>,
    cancel: CancellationToken,
    state: TaskState,
    started: AtomicBool,
}

impl Shared {
    fn cancel(&self) {
        self.cancel.cancel();

        if let Some(stdin) = self.stdin.get() {
            if stdin.close() {
                debug!("producer handle closed by cancellation");
            }
        }

        // Nobody else will report a terminal state for a pipeline that was
        // never started.
        if !self.started.load(Ordering::SeqCst) {
            self.state.finish(TaskOutcome::Cancelled);
        }
    }
}

/// Cloneable handle that cancels a [`BuildLogger`] from another task, for
/// example while `start()` is still pending.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.shared.cancel();
    }
}

/// Logging-pipeline coordinator.
///
/// Typical use:
///
/// ```no_run
/// # async fn demo() -> buildlog::errors::Result<()> {
/// use buildlog::{BuildLogger, BuildLoggerConfig};
///
/// let config = BuildLoggerConfig::new()
///     .with_log_path("/tmp/build.log")
///     .with_filter_cmd("cat")?;
/// let mut logger = BuildLogger::new(config);
/// logger.start().await?;
///
/// if let Some(stdin) = logger.stdin() {
///     stdin.write_all(b"hello\n")?;
/// }
/// logger.close_stdin();
///
/// let outcome = logger.wait().await;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
///
/// Dropping a `BuildLogger` whose pipeline has not finished cancels it, unless
/// the producer handle was already closed: the supervisor then keeps running
/// until the writer and filter have drained, and nothing can observe the
/// outcome any more.
#[derive(Debug)]
pub struct BuildLogger<F: LogWriterFactory = PipeLoggerFactory> {
    config: BuildLoggerConfig,
    factory: F,
    shared: Arc<Shared>,
    filter_pid: Option<u32>,
    main_task: Option<JoinHandle<()>>,
}

impl BuildLogger<PipeLoggerFactory> {
    pub fn new(config: BuildLoggerConfig) -> Self {
        Self::with_writer_factory(config, PipeLoggerFactory)
    }
}

impl<F: LogWriterFactory> BuildLogger<F> {
    pub fn with_writer_factory(config: BuildLoggerConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            shared: Arc::new(Shared {
                stdin: OnceLock::new(),
                cancel: CancellationToken::new(),
                state: TaskState::new(),
                started: AtomicBool::new(false),
            }),
            filter_pid: None,
            main_task: None,
        }
    }

    pub fn config(&self) -> &BuildLoggerConfig {
        &self.config
    }

    /// The producer-facing write end; `None` until `start()` has built the
    /// topology.
    pub fn stdin(&self) -> Option<&ProducerHandle> {
        self.shared.stdin.get()
    }

    /// Close the producer handle. Returns `true` if this call closed it.
    pub fn close_stdin(&self) -> bool {
        self.shared.stdin.get().is_some_and(ProducerHandle::close)
    }

    /// Pid of the filter process, if one was spawned.
    pub fn filter_pid(&self) -> Option<u32> {
        self.filter_pid
    }

    /// `true` while the supervisor task is running.
    pub fn is_supervising(&self) -> bool {
        self.main_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel the pipeline. Idempotent.
    ///
    /// Cascades to the writer and filter through the supervisor and closes the
    /// producer handle, which is what lets a blocked reader see EOF.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Non-blocking: `None` while the pipeline is running.
    pub fn poll(&self) -> Option<TaskOutcome> {
        self.shared.state.poll()
    }

    pub fn returncode(&self) -> Option<i32> {
        self.poll().map(TaskOutcome::returncode)
    }

    /// Wait for the terminal state.
    ///
    /// `Success` only means the logging machinery drained and shut down; the
    /// exit codes of the writer and filter are not inspected.
    pub async fn wait(&self) -> TaskOutcome {
        self.shared.state.wait().await
    }

    /// Build the pipe topology, start the writer and the supervisor.
    ///
    /// Returns once writes on [`BuildLogger::stdin`] will be delivered; it does
    /// not wait for the pipeline to finish.
    ///
    /// - A filter command that cannot be spawned is logged and skipped.
    /// - Pipe allocation and writer startup failures are returned; the
    ///   pipeline then ends as `Failed(1)`.
    /// - Cancellation returns [`BuildLogError::Cancelled`] after the live
    ///   children have been stopped.
    pub async fn start(&mut self) -> Result<()> {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(BuildLogError::Other(anyhow!("build logger already started")));
        }

        if self.shared.cancel.is_cancelled() {
            self.shared.state.finish(TaskOutcome::Cancelled);
            return Err(BuildLogError::Cancelled);
        }

        match self.async_start().await {
            Ok(()) => Ok(()),
            Err(BuildLogError::Cancelled) => {
                info!("build logger cancelled during startup");
                self.shared.cancel();
                self.shared.state.finish(TaskOutcome::Cancelled);
                Err(BuildLogError::Cancelled)
            }
            Err(e) => {
                error!(error = %e, "build logger failed to start");
                self.close_stdin();
                self.shared.state.finish(TaskOutcome::Failed(1));
                Err(e)
            }
        }
    }

    async fn async_start(&mut self) -> Result<()> {
        let mut filter_proc = None;
        let mut log_input = None;

        if self.config.log_path.is_some() {
            if let Some((proc, reader)) = self.spawn_filter()? {
                self.filter_pid = proc.id();
                filter_proc = Some(proc);
                log_input = Some(reader);
            }
        }

        // No filter configured, or it could not be spawned: log directly.
        let log_input = match log_input {
            Some(reader) => reader,
            None => {
                let (reader, writer) = io::pipe()?;
                self.set_stdin(ProducerHandle::new(writer))?;
                reader
            }
        };

        // Background mode: the writer must not mirror to our stdout.
        let mut writer = self
            .factory
            .create(log_input, self.config.log_path.as_deref(), true);

        let started = tokio::select! {
            biased;
            _ = self.shared.cancel.cancelled() => Err(BuildLogError::Cancelled),
            res = writer.start() => res,
        };

        if let Err(e) = started {
            cancel_children(&mut writer, filter_proc.as_mut()).await;
            return Err(e);
        }

        debug!(
            log_path = ?self.config.log_path,
            filtered = filter_proc.is_some(),
            "log writer started"
        );

        let (exit_tx, exit_rx) = oneshot::channel();
        self.main_task = Some(tokio::spawn(supervise(
            writer,
            filter_proc,
            self.shared.cancel.clone(),
            exit_tx,
        )));
        tokio::spawn(observe_exit(exit_rx, Arc::clone(&self.shared)));

        Ok(())
    }

    /// Spawn the configured filter between two fresh pipes.
    ///
    /// On success the producer handle is the filter's stdin, and the returned
    /// reader is the filter's combined stdout/stderr. `Ok(None)` means no filter
    /// is configured or it could not be spawned; every pipe end created here
    /// has been closed in that case.
    fn spawn_filter(&self) -> Result<Option<(FilterProcess, PipeReader)>> {
        let Some(filter) = &self.config.filter else {
            return Ok(None);
        };

        let (filter_input, stdin) = io::pipe()?;
        let (log_input, filter_output) = io::pipe()?;
        let filter_stderr = filter_output.try_clone()?;

        match FilterProcess::spawn(
            filter,
            self.config.environment.as_ref(),
            filter_input,
            filter_output,
            filter_stderr,
        ) {
            Ok(proc) => {
                self.set_stdin(ProducerHandle::new(stdin))?;
                Ok(Some((proc, log_input)))
            }
            Err(e) => {
                warn!(
                    filter = %filter,
                    error = %e,
                    "filter command is missing or unusable; logging unfiltered"
                );
                drop(stdin);
                drop(log_input);
                Ok(None)
            }
        }
    }

    fn set_stdin(&self, handle: ProducerHandle) -> Result<()> {
        self.shared
            .stdin
            .set(handle)
            .map_err(|_| BuildLogError::Other(anyhow!("producer handle already set")))
    }
}

impl<F: LogWriterFactory> Drop for BuildLogger<F> {
    fn drop(&mut self) {
        if self.shared.state.poll().is_some() {
            return;
        }

        // Producer is done: let the supervisor drain what is still in flight.
        let draining = self.main_task.is_some()
            && self.shared.stdin.get().is_some_and(ProducerHandle::is_closed);
        if draining {
            debug!("build logger dropped after its producer closed; draining in background");
            return;
        }

        debug!("build logger dropped before finishing; cancelling");
        self.shared.cancel();
    }
}

/// Translate the supervisor's exit into the coordinator's terminal state.
///
/// A supervisor that disappears without reporting (aborted with the runtime)
/// counts as cancelled.
async fn observe_exit(exit_rx: oneshot::Receiver<SupervisorExit>, shared: Arc<Shared>) {
    match exit_rx.await {
        Ok(SupervisorExit::Completed) => {
            debug!("supervisor completed");
            shared.state.finish(TaskOutcome::Success);
        }
        Ok(SupervisorExit::Cancelled) | Err(_) => {
            debug!("supervisor cancelled");
            shared.cancel();
            shared.state.finish(TaskOutcome::Cancelled);
        }
    }
}
