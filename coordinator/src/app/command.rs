//! Command execution for the coordinator.
//!
//! Every interaction with the hypervisor and the cluster goes through a
//! [`CommandRunner`], so the power operations never spawn processes directly.

use std::{io, process::Stdio};

use futures::future::BoxFuture;
use thiserror::Error as ThisError;
use tokio::process;
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Raw bytes written to stdout.
    pub stdout: Vec<u8>,
    /// Raw bytes written to stderr.
    pub stderr: Vec<u8>,
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
}

impl CommandOutput {
    /// Output of a successful command that printed `stdout`.
    #[must_use]
    pub fn with_stdout(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            status: Some(0),
        }
    }

    /// Whether the process exited with status `0`.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.status, Some(0))
    }

    /// Turns a non-zero exit into [`CommandError::Failed`].
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Failed`] if the process did not exit with status `0`.
    pub fn ensure_success(self, argv: &[String]) -> Result<Self, CommandError> {
        if self.success() {
            Ok(self)
        } else {
            Err(CommandError::Failed {
                command: argv.join(" "),
                status: self.status,
                stderr: String::from_utf8_lossy(&self.stderr).trim_end().to_string(),
            })
        }
    }
}

/// Errors from running an external command.
#[derive(Debug, ThisError)]
pub enum CommandError {
    #[error("Refusing to run an empty command")]
    EmptyCommand,
    #[error("Failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with status {status:?}: {stderr}")]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// Runs an argv vector and captures its output.
///
/// Implementations must not treat a non-zero exit as an error; callers
/// decide that via [`CommandOutput::ensure_success`].
pub trait CommandRunner: Send + Sync {
    fn run<'call>(
        &'call self,
        argv: &'call [String],
    ) -> BoxFuture<'call, Result<CommandOutput, CommandError>>;
}

/// [`CommandRunner`] that spawns real processes. Arguments are passed verbatim, no shell is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run<'call>(
        &'call self,
        argv: &'call [String],
    ) -> BoxFuture<'call, Result<CommandOutput, CommandError>> {
        Box::pin(async move {
            let Some((program, args)) = argv.split_first() else {
                return Err(CommandError::EmptyCommand);
            };
            debug!(command = %argv.join(" "), "Executing command");

            let output = process::Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|source| CommandError::Spawn {
                    command: argv.join(" "),
                    source,
                })?;

            Ok(CommandOutput {
                stdout: output.stdout,
                stderr: output.stderr,
                status: output.status.code(),
            })
        })
    }
}

/// Concatenates a configured command prefix with per-call arguments.
pub(crate) fn argv<'arg>(prefix: &[String], args: impl IntoIterator<Item = &'arg str>) -> Vec<String> {
    prefix
        .iter()
        .cloned()
        .chain(args.into_iter().map(str::to_string))
        .collect()
}
