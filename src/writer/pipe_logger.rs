// src/writer/pipe_logger.rs

//! Production log writer: drains a pipe read end into a [`LogSink`].

use std::fs::File;
use std::future::Future;
use std::io::PipeReader;
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::io::{AsyncReadExt, AsyncWriteExt, Stdout};
use tokio::net::unix::pipe;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::errors::{BuildLogError, Result};
use crate::task_state::TaskState;
use crate::types::TaskOutcome;
use crate::writer::LogWriter;
use crate::writer::sink::LogSink;

/// Size of a single read from the input pipe.
pub const READ_BUF_SIZE: usize = 4096;

/// Reads everything from `input` until EOF and persists it.
///
/// - With a log path, bytes are appended to the file (gzip-compressed for
///   `.gz` paths).
/// - Without one, bytes are drained and dropped so the producer never blocks
///   on a full pipe.
/// - Unless `background` is set, bytes are mirrored to stdout as well.
///
/// Dropping a started `PipeLogger` cancels its I/O loop.
#[derive(Debug)]
pub struct PipeLogger {
    input: Option<PipeReader>,
    log_file_path: Option<PathBuf>,
    background: bool,
    state: TaskState,
    cancel: CancellationToken,
    io_task: Option<JoinHandle<()>>,
}

impl PipeLogger {
    pub fn new(input: PipeReader, log_file_path: Option<PathBuf>, background: bool) -> Self {
        Self {
            input: Some(input),
            log_file_path,
            background,
            state: TaskState::new(),
            cancel: CancellationToken::new(),
            io_task: None,
        }
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    async fn start_inner(&mut self) -> Result<()> {
        let input = self
            .input
            .take()
            .ok_or_else(|| BuildLogError::WriterStart("writer already started".to_string()))?;

        let sink = LogSink::open(self.log_file_path.as_deref())
            .await
            .map_err(|e| {
                BuildLogError::WriterStart(format!(
                    "opening log file {:?}: {e}",
                    self.log_file_path
                ))
            })?;

        let receiver = pipe::Receiver::from_file(File::from(OwnedFd::from(input)))
            .map_err(|e| BuildLogError::WriterStart(format!("registering input pipe: {e}")))?;

        let mirror = if self.background {
            None
        } else {
            Some(tokio::io::stdout())
        };

        debug!(
            log_path = ?self.log_file_path,
            background = self.background,
            "pipe logger started"
        );

        self.io_task = Some(tokio::spawn(io_loop(
            receiver,
            sink,
            mirror,
            self.cancel.clone(),
            self.state.clone(),
        )));

        Ok(())
    }
}

impl LogWriter for PipeLogger {
    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.start_inner())
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        let state = self.state.clone();
        Box::pin(async move { state.wait().await })
    }

    fn poll(&self) -> Option<TaskOutcome> {
        self.state.poll()
    }

    fn cancel(&mut self) {
        self.cancel.cancel();
        // Never started: nothing will ever report, so report here.
        if self.io_task.is_none() {
            self.input = None;
            self.state.finish(TaskOutcome::Cancelled);
        }
    }
}

impl Drop for PipeLogger {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn io_loop(
    mut input: pipe::Receiver,
    mut sink: LogSink,
    mut mirror: Option<Stdout>,
    cancel: CancellationToken,
    state: TaskState,
) {
    let mut buf = vec![0u8; READ_BUF_SIZE];

    let outcome = loop {
        let n = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("pipe logger cancelled");
                break TaskOutcome::Cancelled;
            }

            res = input.read(&mut buf) => match res {
                Ok(n) => n,
                Err(e) => {
                    error!(error = %e, "reading log input failed");
                    break TaskOutcome::Failed(1);
                }
            },
        };

        if n == 0 {
            debug!("log input reached EOF");
            break TaskOutcome::Success;
        }

        if let Some(out) = mirror.as_mut() {
            let mirrored = async {
                out.write_all(&buf[..n]).await?;
                out.flush().await
            };
            if let Err(e) = mirrored.await {
                warn!(error = %e, "mirroring log output to stdout failed; disabling mirror");
                mirror = None;
            }
        }

        if let Err(e) = sink.write_chunk(&buf[..n]).await {
            error!(error = %e, "writing log output failed");
            break TaskOutcome::Failed(1);
        }
    };

    // Release the read end before reporting, so a finished writer holds no
    // descriptors.
    drop(input);

    let outcome = match sink.finish().await {
        Ok(()) => outcome,
        Err(e) => {
            error!(error = %e, "finalizing log file failed");
            match outcome {
                TaskOutcome::Success => TaskOutcome::Failed(1),
                other => other,
            }
        }
    };

    state.finish(outcome);
}
