// src/task_state.rs

//! Set-once terminal state shared between a task and its observers.
//!
//! Both the pipeline coordinator and the concrete log writer report their
//! completion through a [`TaskState`]. The first call to [`TaskState::finish`]
//! wins; later calls are ignored, so racing completion paths (natural exit vs.
//! cancellation) cannot overwrite each other.

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::TaskOutcome;

#[derive(Debug, Clone)]
pub struct TaskState {
    tx: Arc<watch::Sender<Option<TaskOutcome>>>,
}

impl TaskState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Record `outcome` unless an outcome was already recorded.
    ///
    /// Returns `true` if this call set the terminal state.
    pub fn finish(&self, outcome: TaskOutcome) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(outcome);
                true
            } else {
                false
            }
        })
    }

    /// Non-blocking check: `None` while the task is still running.
    pub fn poll(&self) -> Option<TaskOutcome> {
        *self.tx.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.poll().is_some()
    }

    /// Wait until a terminal state is recorded.
    pub async fn wait(&self) -> TaskOutcome {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).unwrap_or(TaskOutcome::Cancelled),
            // Unreachable while `self` holds the sender.
            Err(_) => TaskOutcome::Cancelled,
        }
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::new()
    }
}
