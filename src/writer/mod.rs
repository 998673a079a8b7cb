// src/writer/mod.rs

//! Persisting-writer layer.
//!
//! The coordinator talks to a [`LogWriter`] created by a [`LogWriterFactory`]
//! instead of a concrete writer type. Production code uses
//! [`PipeLoggerFactory`], which builds a [`PipeLogger`] that drains the pipe
//! into a (possibly gzip-compressed) file. Tests can provide factories whose
//! writers fail, stall, or record what they were given.

use std::future::Future;
use std::io::PipeReader;
use std::path::Path;
use std::pin::Pin;

use crate::errors::Result;
use crate::types::TaskOutcome;

pub mod pipe_logger;
pub mod sink;

pub use pipe_logger::{PipeLogger, READ_BUF_SIZE};
pub use sink::LogSink;

/// Terminal consumer of the pipeline's byte stream.
pub trait LogWriter: Send + 'static {
    /// Prepare the destination and begin draining the input.
    ///
    /// Returns once the writer is consuming; it does not wait for EOF.
    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Wait until the writer has reached a terminal state.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>>;

    /// Non-blocking liveness check: `None` while still running.
    fn poll(&self) -> Option<TaskOutcome>;

    /// Request cancellation. Idempotent.
    fn cancel(&mut self);
}

/// Creates the writer for one pipeline start.
pub trait LogWriterFactory: Send + Sync + 'static {
    type Writer: LogWriter;

    /// `background = true` means the writer must not mirror its input to the
    /// console.
    fn create(
        &self,
        input: PipeReader,
        log_file_path: Option<&Path>,
        background: bool,
    ) -> Self::Writer;
}

/// Factory for the production [`PipeLogger`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeLoggerFactory;

impl LogWriterFactory for PipeLoggerFactory {
    type Writer = PipeLogger;

    fn create(
        &self,
        input: PipeReader,
        log_file_path: Option<&Path>,
        background: bool,
    ) -> PipeLogger {
        PipeLogger::new(input, log_file_path.map(Path::to_path_buf), background)
    }
}
