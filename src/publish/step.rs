//! The fixed publish sequence as data.
//!
//! ```text
//! add <document>
//! add <asset dir>
//! commit -m <message>
//! push <remote> <branch>
//! ── only when <branch> != <main> ──
//! checkout <main>
//! merge <branch> --no-edit
//! push <remote> <main>
//! checkout <branch>
//! ```
//!
//! Each step carries the output patterns that make a non-zero exit harmless.

use super::runner::CommandOutput;
use crate::config::PublishConfig;
use std::path::Path;

/// Output fragments (lowercase) meaning "nothing to do".
pub const BENIGN_PATTERNS: &[&str] = &[
    "nothing to commit",
    "already up to date",
    "already up-to-date",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishStep {
    /// Operator-facing label.
    pub description: String,
    /// Arguments passed to the git binary.
    pub args: Vec<String>,
    benign: &'static [&'static str],
}

impl PublishStep {
    fn new(description: impl Into<String>, args: &[&str]) -> Self {
        Self {
            description: description.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            benign: BENIGN_PATTERNS,
        }
    }

    /// `git add ...` style rendering for display and diagnostics.
    pub fn command_line(&self, program: &str) -> String {
        let mut line = program.to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.contains(char::is_whitespace) {
                line.push_str(&format!("\"{arg}\""));
            } else {
                line.push_str(arg);
            }
        }
        line
    }

    /// A failed exit whose output says there was nothing to do.
    pub fn is_benign_failure(&self, output: &CommandOutput) -> bool {
        let text = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
        self.benign.iter().any(|pattern| text.contains(pattern))
    }
}

/// The ordered step list for publishing from `branch`.
pub fn plan(
    branch: &str,
    settings: &PublishConfig,
    document: &Path,
    asset_dir: &Path,
) -> Vec<PublishStep> {
    let document = document.to_string_lossy();
    let asset_dir = asset_dir.to_string_lossy();
    let remote = settings.remote.as_str();
    let main = settings.main_branch.as_str();

    let mut steps = vec![
        PublishStep::new(format!("Adding {document}"), &["add", &document]),
        PublishStep::new("Adding gallery images", &["add", &asset_dir]),
        PublishStep::new(
            "Creating commit",
            &["commit", "-m", &settings.commit_message],
        ),
        PublishStep::new(format!("Pushing to {branch}"), &["push", remote, branch]),
    ];

    if branch != main {
        steps.extend([
            PublishStep::new(format!("Switching to {main}"), &["checkout", main]),
            PublishStep::new(
                format!("Merging {branch} into {main}"),
                &["merge", branch, "--no-edit"],
            ),
            PublishStep::new(format!("Pushing to {main}"), &["push", remote, main]),
            PublishStep::new(format!("Switching back to {branch}"), &["checkout", branch]),
        ]);
    }

    steps
}
