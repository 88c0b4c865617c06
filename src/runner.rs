//! Process runner - spawns and supervises one child process per test case
//!
//! The runner does NOT compare outputs or decide pass/fail; it only reports
//! what the process did. Every call is bounded by a wall-clock deadline: on
//! expiry the child's whole process group is killed and a timeout error is
//! returned instead of partial output.
//!
//! Isolation here is directory-only. For production use, implementations of
//! [`Runner`] are the seam to route the spawn through an external sandbox
//! (container, microVM, or restricted user) instead of reimplementing one.

use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::{setpgid, Pid};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::JudgeError;

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self { program, args }
    }
}

/// Raw execution status (no pass/fail interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program to completion within its deadline
#[derive(Debug)]
pub struct RunOutcome {
    /// Execution status
    pub status: RunStatus,
    /// Stdout content
    pub stdout: String,
    /// Stderr content
    pub stderr: String,
    /// Wall-clock time in milliseconds
    pub time_ms: u32,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Runner trait for executing programs.
///
/// The default implementation spawns directly on the host; a sandboxing
/// implementation can wrap the spawn without the harness noticing.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run one process in `work_dir`, feed it `stdin_bytes`, and collect
    /// its output until exit or `deadline`.
    async fn run(
        &self,
        cmd: &CommandSpec,
        work_dir: &Path,
        stdin_bytes: &[u8],
        deadline: Duration,
    ) -> Result<RunOutcome, JudgeError>;
}

/// Runner that spawns child processes directly on the host
#[derive(Debug, Default)]
pub struct DirectRunner;

#[async_trait]
impl Runner for DirectRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        work_dir: &Path,
        stdin_bytes: &[u8],
        deadline: Duration,
    ) -> Result<RunOutcome, JudgeError> {
        debug!(
            "Running {} {:?} in {:?} (deadline {}ms)",
            cmd.program,
            cmd.args,
            work_dir,
            deadline.as_millis()
        );

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(work_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Place the child in its own process group so a timeout kill also
        // reaps descendants it may have spawned.
        unsafe {
            command.pre_exec(|| {
                setpgid(Pid::from_raw(0), Pid::from_raw(0)).map_err(std::io::Error::from)?;
                Ok(())
            });
        }

        let mut child = command.spawn().map_err(|e| JudgeError::Spawn {
            program: cmd.program.clone(),
            source: e,
        })?;

        let pgid = child.id().map(|pid| Pid::from_raw(pid as i32));
        let started = Instant::now();

        let stdin_bytes = stdin_bytes.to_vec();
        let wait = async move {
            if let Some(mut stdin) = child.stdin.take() {
                // Closing stdin signals end-of-input; a program that exits
                // without draining it breaks the pipe, which is not an error.
                let _ = stdin.write_all(&stdin_bytes).await;
            }
            child.wait_with_output().await
        };

        match timeout(deadline, wait).await {
            Ok(output) => {
                let output = output.map_err(JudgeError::Io)?;
                let time_ms = started.elapsed().as_millis() as u32;

                let status = match output.status.code() {
                    Some(code) => RunStatus::Exited(code),
                    None => RunStatus::Signaled(output.status.signal().unwrap_or(-1)),
                };

                Ok(RunOutcome {
                    status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    time_ms,
                })
            }
            Err(_) => {
                // Deadline expired: the dropped future kills the direct
                // child (kill_on_drop); sweep the rest of its group.
                if let Some(pgid) = pgid {
                    if let Err(e) = killpg(pgid, Signal::SIGKILL) {
                        debug!("killpg({}) after timeout: {}", pgid, e);
                    }
                }
                Err(JudgeError::Timeout(deadline))
            }
        }
    }
}
