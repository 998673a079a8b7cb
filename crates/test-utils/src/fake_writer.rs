use std::future::Future;
use std::io::{PipeReader, Read};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use buildlog::errors::{BuildLogError, Result};
use buildlog::task_state::TaskState;
use buildlog::types::TaskOutcome;
use buildlog::writer::{LogWriter, LogWriterFactory};

/// How a fake writer's `start()` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeStart {
    /// Start, then record everything read from the input until EOF.
    Record,
    /// Fail with `WriterStart`.
    Fail,
    /// Never return from `start()`.
    Stall,
}

/// What the fake writers created by one factory observed.
#[derive(Debug, Clone, Default)]
pub struct ProbeState {
    pub created: usize,
    pub background: Option<bool>,
    pub log_path: Option<PathBuf>,
    pub started: bool,
    pub cancelled: bool,
    pub received: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeWriterProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl FakeWriterProbe {
    pub fn snapshot(&self) -> ProbeState {
        self.inner.lock().unwrap().clone()
    }

    pub fn received(&self) -> Vec<u8> {
        self.inner.lock().unwrap().received.clone()
    }

    fn update(&self, f: impl FnOnce(&mut ProbeState)) {
        f(&mut self.inner.lock().unwrap());
    }
}

/// A writer factory that hands out [`FakeWriter`]s.
pub struct FakeWriterFactory {
    behaviour: FakeStart,
    probe: FakeWriterProbe,
}

impl FakeWriterFactory {
    pub fn new(behaviour: FakeStart) -> (Self, FakeWriterProbe) {
        let probe = FakeWriterProbe::default();
        (
            Self {
                behaviour,
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl LogWriterFactory for FakeWriterFactory {
    type Writer = FakeWriter;

    fn create(
        &self,
        input: PipeReader,
        log_file_path: Option<&Path>,
        background: bool,
    ) -> FakeWriter {
        self.probe.update(|p| {
            p.created += 1;
            p.background = Some(background);
            p.log_path = log_file_path.map(Path::to_path_buf);
        });

        FakeWriter {
            input: Some(input),
            behaviour: self.behaviour,
            state: TaskState::new(),
            probe: self.probe.clone(),
        }
    }
}

/// In-memory writer used in place of `PipeLogger`.
pub struct FakeWriter {
    input: Option<PipeReader>,
    behaviour: FakeStart,
    state: TaskState,
    probe: FakeWriterProbe,
}

impl LogWriter for FakeWriter {
    fn start(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            match self.behaviour {
                FakeStart::Fail => Err(BuildLogError::WriterStart(
                    "fake writer refused to start".to_string(),
                )),
                FakeStart::Stall => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
                FakeStart::Record => {
                    let mut input = self.input.take().expect("fake writer started twice");
                    let probe = self.probe.clone();
                    let state = self.state.clone();
                    probe.update(|p| p.started = true);

                    tokio::task::spawn_blocking(move || {
                        let mut buf = [0u8; 1024];
                        loop {
                            match input.read(&mut buf) {
                                Ok(0) | Err(_) => break,
                                Ok(n) => probe.update(|p| p.received.extend_from_slice(&buf[..n])),
                            }
                        }
                        state.finish(TaskOutcome::Success);
                    });
                    Ok(())
                }
            }
        })
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = TaskOutcome> + Send + '_>> {
        let state = self.state.clone();
        Box::pin(async move { state.wait().await })
    }

    fn poll(&self) -> Option<TaskOutcome> {
        self.state.poll()
    }

    fn cancel(&mut self) {
        self.probe.update(|p| p.cancelled = true);
        self.input = None;
        self.state.finish(TaskOutcome::Cancelled);
    }
}
