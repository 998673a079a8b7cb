// src/types.rs

/// Returncode reported for a cancelled task (negative SIGINT).
pub const CANCELLED_RETURNCODE: i32 = -2;

/// Terminal outcome of an asynchronous task (the coordinator or a writer).
///
/// - `Success`: the task ran to its natural end.
/// - `Failed(code)`: the task stopped because of an error; `code` is its
///   returncode.
/// - `Cancelled`: the task was cancelled before reaching its natural end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
    Cancelled,
}

impl TaskOutcome {
    pub fn returncode(self) -> i32 {
        match self {
            TaskOutcome::Success => 0,
            TaskOutcome::Failed(code) => code,
            TaskOutcome::Cancelled => CANCELLED_RETURNCODE,
        }
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, TaskOutcome::Cancelled)
    }
}
