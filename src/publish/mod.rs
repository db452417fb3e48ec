//! Publishing the site with git.
//!
//! [`Publisher::publish`] asks git for the current branch, builds the step
//! list with [`step::plan`], and runs it strictly in order. A step that exits
//! non-zero is tolerated only when [`PublishStep::is_benign_failure`] says so;
//! anything else stops the sequence. Completed steps are never rolled back,
//! so the returned [`PublishReport`] always lists what actually ran. A report
//! whose last step failed after "Creating commit" describes a commit that
//! exists locally but was not pushed.
//!
//! The sequence runs on a dedicated thread via [`worker::spawn`], with a
//! [`worker::PublishGate`] keeping a second publish from starting while one is
//! in flight.

pub mod runner;
pub mod step;
pub mod worker;

pub use runner::{CommandOutput, CommandRunner, DuctRunner, RunnerError};
pub use step::PublishStep;
pub use worker::{PublishGate, PublishHandle};

use crate::config::PublishConfig;
use crate::store::Gallery;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("Could not determine the current branch: {0}")]
    BranchQuery(String),
    #[error("Not on a branch (detached HEAD); check out a branch before publishing")]
    DetachedHead,
    #[error("'{step}' failed: {diagnostic}")]
    StepFailed { step: String, diagnostic: String },
    #[error("'{step}' timed out after {secs}s")]
    Timeout { step: String, secs: u64 },
    #[error("'{step}' could not run: {message}")]
    Spawn { step: String, message: String },
    #[error("A publish is already running")]
    AlreadyRunning,
    #[error("Publish worker stopped unexpectedly")]
    WorkerPanicked,
}

impl PublishError {
    fn from_runner(step: &str, err: RunnerError) -> Self {
        match err {
            RunnerError::Timeout { timeout, .. } => PublishError::Timeout {
                step: step.to_string(),
                secs: timeout.as_secs(),
            },
            RunnerError::Spawn { source, .. } => PublishError::Spawn {
                step: step.to_string(),
                message: source.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    /// Non-zero exit matching a benign pattern.
    NothingToDo,
    Failed,
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub description: String,
    pub command: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Outcome of a publish run, complete or partial.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Branch the run started on, when it could be determined.
    pub branch: Option<String>,
    /// Steps that ran, in order. A failed run ends with the failing step
    /// unless the failure was a timeout or spawn error.
    pub steps: Vec<StepResult>,
    pub error: Option<PublishError>,
}

impl PublishReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(mut self, error: PublishError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Progress notifications for whoever is watching the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishEvent {
    Branch(String),
    StepStarted {
        index: usize,
        total: usize,
        description: String,
        command: String,
    },
    StepFinished(StepResult),
    Finished { success: bool },
}

/// Working tree state from `git status --short`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitStatus {
    /// One porcelain line per changed path.
    pub entries: Vec<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs git for one site repository.
pub struct Publisher<R> {
    runner: R,
    repo_root: PathBuf,
    settings: PublishConfig,
    document: PathBuf,
    asset_dir: PathBuf,
}

impl<R: CommandRunner> Publisher<R> {
    /// `document` and `asset_dir` are relative to `repo_root`.
    pub fn new(
        runner: R,
        repo_root: impl Into<PathBuf>,
        settings: PublishConfig,
        document: impl Into<PathBuf>,
        asset_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            repo_root: repo_root.into(),
            settings,
            document: document.into(),
            asset_dir: asset_dir.into(),
        }
    }

    /// Publisher for the repository at the gallery's site root.
    pub fn for_gallery(runner: R, gallery: &Gallery) -> Self {
        let config = gallery.config();
        Self::new(
            runner,
            gallery.root(),
            config.publish.clone(),
            &config.document,
            &config.assets.dir,
        )
    }

    fn git(&self, args: &[String]) -> Result<CommandOutput, RunnerError> {
        self.runner.run(
            &self.settings.git,
            args,
            &self.repo_root,
            self.settings.command_timeout(),
        )
    }

    /// Name of the checked-out branch.
    pub fn current_branch(&self) -> Result<String, PublishError> {
        let args = ["branch".to_string(), "--show-current".to_string()];
        let output = self
            .git(&args)
            .map_err(|e| PublishError::from_runner("Reading current branch", e))?;
        if !output.success() {
            return Err(PublishError::BranchQuery(output.diagnostic()));
        }
        let branch = output.stdout.trim().to_string();
        if branch.is_empty() {
            return Err(PublishError::DetachedHead);
        }
        Ok(branch)
    }

    /// Short working tree status.
    pub fn status(&self) -> Result<GitStatus, PublishError> {
        let args = ["status".to_string(), "--short".to_string()];
        let output = self
            .git(&args)
            .map_err(|e| PublishError::from_runner("Checking status", e))?;
        if !output.success() {
            return Err(PublishError::StepFailed {
                step: "Checking status".to_string(),
                diagnostic: output.diagnostic(),
            });
        }
        Ok(GitStatus {
            entries: output
                .stdout
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    /// Run the full sequence, reporting progress on `events` if given.
    pub fn publish(&self, events: Option<&Sender<PublishEvent>>) -> PublishReport {
        let emit = |event: PublishEvent| {
            if let Some(tx) = events {
                // The watcher going away must not stop a publish midway.
                let _ = tx.send(event);
            }
        };

        let report = self.run_sequence(&emit);
        emit(PublishEvent::Finished {
            success: report.is_success(),
        });
        report
    }

    fn run_sequence(&self, emit: &dyn Fn(PublishEvent)) -> PublishReport {
        let mut report = PublishReport::default();

        let branch = match self.current_branch() {
            Ok(branch) => branch,
            Err(e) => return report.failed(e),
        };
        tracing::info!("Publishing from branch {branch}");
        emit(PublishEvent::Branch(branch.clone()));
        report.branch = Some(branch.clone());

        let steps = step::plan(&branch, &self.settings, &self.document, &self.asset_dir);
        let total = steps.len();

        for (index, step) in steps.iter().enumerate() {
            let command = step.command_line(&self.settings.git);
            emit(PublishEvent::StepStarted {
                index,
                total,
                description: step.description.clone(),
                command: command.clone(),
            });

            let output = match self.git(&step.args) {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!("{command}: {e}");
                    return report.failed(PublishError::from_runner(&step.description, e));
                }
            };

            let status = if output.success() {
                StepStatus::Succeeded
            } else if step.is_benign_failure(&output) {
                StepStatus::NothingToDo
            } else {
                StepStatus::Failed
            };
            tracing::debug!("{command} -> {status:?} ({:?})", output.exit_code);

            let result = StepResult {
                description: step.description.clone(),
                command,
                status,
                exit_code: output.exit_code,
                stdout: output.stdout.clone(),
                stderr: output.stderr.clone(),
            };
            emit(PublishEvent::StepFinished(result.clone()));
            report.steps.push(result);

            if status == StepStatus::Failed {
                return report.failed(PublishError::StepFailed {
                    step: step.description.clone(),
                    diagnostic: output.diagnostic(),
                });
            }
        }

        report
    }
}
