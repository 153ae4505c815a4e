//! Scenario: Change-Set Deploy
//!
//! Journey: a push event lists the files that changed between two commits;
//! only those are mirrored, and the deployed revision is recorded last.

use ferry::domain::services::REVISION_FILE;
use ferry::domain::value_objects::{Endpoint, LocalScope, Protocol};
use ferry::infrastructure::backends::MemoryBackend;
use ferry::{compile, DeployOptions, DeployUseCase, Verb};
use tempfile::tempdir;

use crate::common::*;

#[test]
fn scenario_change_set_mirrors_only_changed_files() {
    let dir = tempdir().unwrap();
    site_tree(dir.path());
    let root = dir.path().to_string_lossy().into_owned();

    let change_set = serde_json::json!({
        "sha": "abc123",
        "files": [
            { "filename": format!("{root}/dist/index.html"), "status": "modified" },
            { "filename": format!("{root}/dist/gone.html"), "status": "removed" },
            { "filename": format!("{root}/notes/todo.txt"), "status": "added" },
            {
                "filename": format!("{root}/dist/new.html"),
                "previous_filename": format!("{root}/dist/old.html"),
                "status": "renamed"
            },
            { "filename": format!("{root}/dist/css/site.css"), "status": "unchanged" }
        ]
    });
    let scope = LocalScope::new(dir.path().join("dist"));
    let batch = compile(&change_set.to_string(), "/site", &scope).unwrap();

    let verbs: Vec<Verb> = batch.iter().map(|op| op.verb).collect();
    assert_eq!(
        verbs,
        [Verb::Upload, Verb::Delete, Verb::Upload, Verb::Move, Verb::Write]
    );

    let backend = MemoryBackend::new()
        .with_file("/site/gone.html", "bye")
        .with_file("/site/old.html", "renamed");
    let mut use_case = DeployUseCase::new(backend);
    let options = DeployOptions::new().with_scope(scope);
    let endpoint = Endpoint::new(Protocol::Ftp, "ftp.example.com", "ci").with_password("pw");

    let report = use_case.execute(&endpoint, &batch, &options);

    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.ignored(), 1);
    assert_eq!(
        report.outcomes[2].message.as_deref(),
        Some("outside local path")
    );

    let backend = use_case.backend();
    let revision = format!("/site/{REVISION_FILE}");
    assert_eq!(backend.file("/site/index.html"), Some(&b"<h1>hello</h1>"[..]));
    assert_eq!(backend.file("/site/new.html"), Some(&b"renamed"[..]));
    assert_eq!(backend.file(&revision), Some(&b"abc123"[..]));
    assert!(!backend.exists("/site/gone.html"));
    assert!(!backend.exists("/site/css/site.css"));
}

#[test]
fn scenario_removed_entry_compiles_to_delete_under_root() {
    let change_set = r#"{"files":[{"filename":"a/b.txt","status":"removed"}]}"#;
    let batch = compile(change_set, "/site", &LocalScope::unrestricted()).unwrap();

    assert_eq!(batch.len(), 1);
    assert_eq!(batch.operations()[0].verb, Verb::Delete);
    assert_eq!(batch.operations()[0].source, "/site/a/b.txt");
}
