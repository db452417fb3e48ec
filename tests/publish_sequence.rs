//! Publish runs driven through the public runner seam.

use gallery_manager::config::{ManagerConfig, PublishConfig};
use gallery_manager::publish::{
    CommandOutput, CommandRunner, PublishError, PublishEvent, PublishGate, Publisher,
    RunnerError, StepStatus, worker,
};
use gallery_manager::store::Gallery;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fails exactly one command, succeeds everything else.
#[derive(Clone)]
struct FailingAt {
    branch: &'static str,
    fail: Option<(&'static str, &'static str)>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl FailingAt {
    fn new(branch: &'static str) -> Self {
        Self {
            branch,
            fail: None,
            seen: Arc::default(),
        }
    }

    fn failing(mut self, args: &'static str, stderr: &'static str) -> Self {
        self.fail = Some((args, stderr));
        self
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl CommandRunner for FailingAt {
    fn run(
        &self,
        program: &str,
        args: &[String],
        dir: &Path,
        _timeout: Duration,
    ) -> Result<CommandOutput, RunnerError> {
        assert_eq!(program, "git");
        assert_eq!(dir, Path::new("/srv/site"));
        let joined = args.join(" ");
        self.seen.lock().unwrap().push(joined.clone());

        let ok = |stdout: &str| CommandOutput {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        Ok(match self.fail {
            _ if joined == "branch --show-current" => ok(&format!("{}\n", self.branch)),
            Some((args, stderr)) if args == joined => CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
            _ => ok(""),
        })
    }
}

fn publisher(runner: FailingAt) -> Publisher<FailingAt> {
    let gallery = Gallery::new("/srv/site", ManagerConfig::default());
    Publisher::for_gallery(runner, &gallery)
}

#[test]
fn feature_branch_publishes_and_merges_into_main() {
    let runner = FailingAt::new("feature-x");
    let report = publisher(runner.clone()).publish(None);

    assert!(report.is_success());
    assert_eq!(
        runner.seen(),
        [
            "branch --show-current",
            "add index.html",
            "add assets/gallery",
            "commit -m Update gallery via Gallery Manager",
            "push origin feature-x",
            "checkout main",
            "merge feature-x --no-edit",
            "push origin main",
            "checkout feature-x",
        ]
    );
    assert!(report
        .steps
        .iter()
        .all(|s| s.status == StepStatus::Succeeded));
}

#[test]
fn failed_feature_push_stops_the_run() {
    let runner = FailingAt::new("feature-x").failing(
        "push origin feature-x",
        "error: failed to push some refs to 'origin'",
    );
    let report = publisher(runner.clone()).publish(None);

    let last = report.steps.last().unwrap();
    assert_eq!(last.command, "git push origin feature-x");
    assert_eq!(last.status, StepStatus::Failed);
    assert_eq!(report.steps.len(), 4);
    assert!(matches!(
        report.error,
        Some(PublishError::StepFailed { ref diagnostic, .. })
            if diagnostic.contains("failed to push")
    ));
    assert_eq!(runner.seen().len(), 5);
}

#[test]
fn up_to_date_merge_is_benign() {
    let runner = FailingAt::new("feature-x").failing("merge feature-x --no-edit", "Already up to date.");
    let report = publisher(runner).publish(None);

    assert!(report.is_success());
    assert_eq!(report.steps[5].status, StepStatus::NothingToDo);
    assert_eq!(report.steps.len(), 8);
}

#[test]
fn worker_reports_progress_and_releases_gate() {
    let gate = PublishGate::new();
    let handle = worker::spawn(publisher(FailingAt::new("main")), &gate).unwrap();

    let events: Vec<PublishEvent> = handle.events().iter().collect();
    let report = handle.join().unwrap();

    assert!(report.is_success());
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, PublishEvent::StepFinished(_)))
            .count(),
        4
    );
    assert_eq!(events.last(), Some(&PublishEvent::Finished { success: true }));
    assert!(!gate.is_busy());
}

#[test]
fn custom_settings_flow_into_commands() {
    let settings = PublishConfig {
        remote: "live".into(),
        main_branch: "production".into(),
        commit_message: "Refresh stock".into(),
        ..PublishConfig::default()
    };
    let runner = FailingAt::new("production");
    let publisher = Publisher::new(runner.clone(), "/srv/site", settings, "shop.html", "img");
    assert!(publisher.publish(None).is_success());

    assert_eq!(
        runner.seen()[1..],
        [
            "add shop.html",
            "add img",
            "commit -m Refresh stock",
            "push live production",
        ]
    );
}
