//! External command execution.
//!
//! [`CommandRunner`] is the seam between the publish sequence and the
//! process world. [`DuctRunner`] is the production implementation; tests use
//! a scripted runner that records invocations instead.

use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Exit status and captured output of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Best diagnostic text: stderr, falling back to stdout.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },
}

pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `dir`, with no stdin, killing it after `timeout`.
    ///
    /// A non-zero exit is not an error here; callers inspect the output.
    fn run(
        &self,
        program: &str,
        args: &[String],
        dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, RunnerError>;
}

/// Runs commands through `duct` with captured stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuctRunner;

impl CommandRunner for DuctRunner {
    #[tracing::instrument(skip(self, args, dir, timeout), fields(dir = %dir.display()))]
    fn run(
        &self,
        program: &str,
        args: &[String],
        dir: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, RunnerError> {
        tracing::debug!("Executing: {} {:?}", program, args);

        let spawn_error = |source: io::Error| RunnerError::Spawn {
            program: program.to_string(),
            source,
        };

        let handle = duct::cmd(program, args)
            .dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin_null()
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .start()
            .map_err(spawn_error)?;

        match handle.wait_timeout(timeout).map_err(spawn_error)? {
            Some(output) => Ok(CommandOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            None => {
                if let Err(e) = handle.kill() {
                    tracing::warn!("Could not kill timed-out {program}: {e}");
                }
                Err(RunnerError::Timeout {
                    program: program.to_string(),
                    timeout,
                })
            }
        }
    }
}
