// src/exec/supervisor.rs

//! Supervisor task: decides when a started pipeline is finished.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::exec::filter::FilterProcess;
use crate::writer::LogWriter;

/// How the supervisor ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// Writer and filter both ran to completion (exit codes not inspected).
    Completed,
    /// Cancellation arrived first; live children were cancelled/killed.
    Cancelled,
}

/// Wait for the writer, then the filter, unless `cancel` fires first.
///
/// The writer is downstream of the filter, so it is awaited first: once it has
/// seen EOF the filter has produced all of its output.
///
/// The result is sent over `exit_tx` after both children have been dropped.
pub async fn supervise<W: LogWriter>(
    mut writer: W,
    mut filter: Option<FilterProcess>,
    cancel: CancellationToken,
    exit_tx: oneshot::Sender<SupervisorExit>,
) {
    let completed = tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = drain(&mut writer, filter.as_mut()) => true,
    };

    let exit = if completed {
        SupervisorExit::Completed
    } else {
        info!("pipeline cancelled; stopping writer and filter");
        cancel_children(&mut writer, filter.as_mut()).await;
        SupervisorExit::Cancelled
    };

    drop(writer);
    drop(filter);

    if exit_tx.send(exit).is_err() {
        debug!("supervisor exit receiver dropped");
    }
}

async fn drain<W: LogWriter>(writer: &mut W, filter: Option<&mut FilterProcess>) {
    if writer.poll().is_none() {
        let outcome = writer.wait().await;
        debug!(?outcome, "log writer finished");
    }

    if let Some(filter) = filter {
        if filter.is_running() {
            if let Err(e) = filter.wait().await {
                warn!(error = %e, "waiting for filter process failed");
            }
        }
    }
}

/// Cancel the writer if it is live and kill the filter if it is live.
///
/// Waits for both to stop, so no child outlives the call.
pub async fn cancel_children<W: LogWriter>(writer: &mut W, filter: Option<&mut FilterProcess>) {
    if writer.poll().is_none() {
        writer.cancel();
        let outcome = writer.wait().await;
        debug!(?outcome, "log writer stopped after cancellation");
    }

    if let Some(filter) = filter {
        if filter.is_running() {
            filter.terminate().await;
        }
    }
}
