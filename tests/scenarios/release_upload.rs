//! Scenario: Release Upload
//!
//! Journey: a workflow uploads a build directory, removes a stale page and
//! renames the entry page, skipping log files.
//!
//! Success Criteria:
//! - Every action succeeds, in order
//! - Ignored files are reported but never transferred

use std::sync::{Arc, Mutex};

use ferry::domain::ports::{DeployEvent, DeployEventSink};
use ferry::domain::value_objects::{Endpoint, IgnoreFilter, LocalScope, Protocol};
use ferry::infrastructure::backends::{Call, MemoryBackend};
use ferry::{compile, DeployOptions, DeployUseCase};
use tempfile::tempdir;

use crate::common::*;

#[derive(Default)]
struct Collect(Mutex<Vec<DeployEvent>>);

impl DeployEventSink for Collect {
    fn on_event(&self, event: DeployEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn endpoint() -> Endpoint {
    Endpoint::new(Protocol::Sftp, "deploy.example.com", "ci").with_password("secret")
}

#[test]
fn scenario_release_upload_with_ignored_logs() {
    let dir = tempdir().unwrap();
    site_tree(dir.path());

    let actions = format!(
        "# release\nupload {} /site\ndelete /site/old.html\nmove /site/index.html /site/home.html\n",
        quoted(&dir.path().join("dist"))
    );
    let batch = compile(&actions, "/site", &LocalScope::unrestricted()).unwrap();
    assert_eq!(batch.len(), 3);

    let backend = MemoryBackend::new()
        .with_dir("/site")
        .with_file("/site/old.html", "stale");
    let mut use_case = DeployUseCase::new(backend);
    let options = DeployOptions::new().with_ignore(IgnoreFilter::from_list("*.log").unwrap());
    let sink = Arc::new(Collect::default());

    let report = use_case.execute_with_events(&endpoint(), &batch, &options, sink.clone());

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes[0]
        .message
        .as_deref()
        .is_some_and(|m| m.contains("1 ignored")));

    let backend = use_case.backend();
    assert_eq!(backend.file("/site/home.html"), Some(&b"<h1>hello</h1>"[..]));
    assert_eq!(backend.file("/site/css/site.css"), Some(&b"body{}"[..]));
    assert!(!backend.exists("/site/index.html"));
    assert!(!backend.exists("/site/old.html"));
    assert!(!backend.exists("/site/debug.log"));
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Put(p) if p.ends_with("debug.log"))));

    let events = sink.0.lock().unwrap();
    let ignored_entries = events
        .iter()
        .filter(|e| matches!(e, DeployEvent::Entry { outcome } if outcome.is_ignored()))
        .count();
    assert_eq!(ignored_entries, 1);
    assert!(matches!(
        events.last(),
        Some(DeployEvent::Completed {
            succeeded: 3,
            failed: 0,
            ..
        })
    ));
}

#[test]
fn scenario_failed_action_does_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    site_tree(dir.path());

    let actions = format!(
        "move /site/missing.html /site/other.html\nupload {} /site/todo.txt\n",
        quoted(&dir.path().join("notes/todo.txt"))
    );
    let batch = compile(&actions, "", &LocalScope::unrestricted()).unwrap();

    let mut use_case = DeployUseCase::new(MemoryBackend::new().with_dir("/site"));
    let report = use_case.execute(&endpoint(), &batch, &DeployOptions::new());

    assert!(!report.is_success());
    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.outcomes[0].message.as_deref(),
        Some("source not exists")
    );
    assert!(report.outcomes[1].is_success());
    assert!(!use_case.backend().exists("/site/other.html"));
    assert_eq!(use_case.backend().file("/site/todo.txt"), Some(&b"ship it"[..]));
}
