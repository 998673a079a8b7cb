// src/exec/filter.rs

//! Filter process: the optional command interposed between the producer and
//! the log writer.

use std::collections::BTreeMap;
use std::io::{self, PipeReader, PipeWriter};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::FilterCommand;

/// A running filter command.
///
/// The child is killed if this value is dropped while it is still running.
#[derive(Debug)]
pub struct FilterProcess {
    child: Child,
    pid: Option<u32>,
    display: String,
}

impl FilterProcess {
    /// Spawn `cmd` with the given pipe ends as its stdio.
    ///
    /// The pipe ends are moved into the spawned command. They are closed in
    /// this process when this function returns, whether the spawn succeeded
    /// or not: on success the child holds its own copies, on failure nobody
    /// does.
    pub fn spawn(
        cmd: &FilterCommand,
        env: Option<&BTreeMap<String, String>>,
        stdin: PipeReader,
        stdout: PipeWriter,
        stderr: PipeWriter,
    ) -> io::Result<Self> {
        let mut command = Command::new(cmd.program());
        command
            .args(cmd.args())
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);

        if let Some(env) = env {
            command.env_clear().envs(env);
        }

        let child = command.spawn()?;
        let pid = child.id();
        let shown = cmd.to_string();

        info!(filter = %shown, pid, "filter process started");

        Ok(Self {
            child,
            pid,
            display: shown,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Non-blocking exit check: `None` while the filter is still running.
    ///
    /// Signal deaths are reported as the negated signal number.
    pub fn returncode(&mut self) -> Option<i32> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(returncode_of(status)),
            Ok(None) => None,
            Err(e) => {
                warn!(filter = %self.display, error = %e, "checking filter status failed");
                None
            }
        }
    }

    pub fn is_running(&mut self) -> bool {
        self.returncode().is_none()
    }

    pub async fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait().await?;
        let code = returncode_of(status);
        info!(
            filter = %self.display,
            pid = self.pid,
            exit_code = code,
            "filter process exited"
        );
        Ok(code)
    }

    /// Kill the filter and reap it.
    pub async fn terminate(&mut self) {
        debug!(filter = %self.display, pid = self.pid, "terminating filter process");
        if let Err(e) = self.child.kill().await {
            debug!(
                filter = %self.display,
                pid = self.pid,
                error = %e,
                "filter process already gone while terminating"
            );
        }
    }
}

fn returncode_of(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}
