use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::*;
use crate::domain::ports::TreeTransfer;
use crate::domain::value_objects::{EntryKind, Endpoint, Protocol};
use crate::infrastructure::backends::{Call, MemoryBackend};

#[derive(Default)]
struct RecordingEventSink {
    events: Arc<Mutex<Vec<DeployEvent>>>,
}

impl RecordingEventSink {
    fn entries(&self) -> Vec<Outcome> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                DeployEvent::Entry { outcome } => Some(outcome.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DeployEventSink for RecordingEventSink {
    fn on_event(&self, event: DeployEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn connected(backend: MemoryBackend) -> MemoryBackend {
    let mut backend = backend;
    let endpoint = Endpoint::new(Protocol::Ftp, "localhost", "deploy");
    assert!(backend.connect(&endpoint).ok);
    backend
}

/// dist/index.html, dist/debug.log, dist/css/site.css
fn site_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("css")).unwrap();
    fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
    fs::write(dir.path().join("debug.log"), "noise").unwrap();
    fs::write(dir.path().join("css/site.css"), "body{}").unwrap();
    dir
}

#[test]
fn upload_missing_source_fails_without_calls() {
    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(Path::new("/no/such/dir"), "/site")
        .unwrap();

    assert!(outcome.is_failure());
    assert_eq!(outcome.message.as_deref(), Some("source not exist"));
    assert_eq!(outcome.file, "/site");
    assert_eq!(backend.transfer_count(), 0);
}

#[test]
fn upload_single_file_creates_parents() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(&dir.path().join("index.html"), "/site/deep/index.html")
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(backend.file("/site/deep/index.html"), Some(&b"<h1>hi</h1>"[..]));
}

#[test]
fn upload_dir_skips_ignored_entries() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::new(["*.log"]).unwrap();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.message.as_deref(),
        Some("2 uploaded, 1 ignored, 0 failed")
    );
    assert!(!backend.exists("/site/debug.log"));
    assert!(!backend.calls().contains(&Call::Put("/site/debug.log".into())));
    assert_eq!(backend.file("/site/css/site.css"), Some(&b"body{}"[..]));

    let ignored: Vec<_> = sink
        .entries()
        .into_iter()
        .filter(|o| o.is_ignored())
        .map(|o| o.file)
        .collect();
    assert_eq!(ignored, ["/site/debug.log"]);
}

#[test]
fn upload_dir_replaces_a_file_occupying_the_root() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new().with_file("/site", "not a dir"));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert!(outcome.is_success());
    assert!(backend.is_dir("/site"));
    assert!(backend.exists("/site/index.html"));
}

#[test]
fn ignored_directory_is_not_descended() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::new(["css"]).unwrap();
    let sink = RecordingEventSink::default();

    SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert!(!backend.exists("/site/css"));
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Put(p) if p.starts_with("/site/css"))));
}

#[cfg(unix)]
#[test]
fn upload_follows_nested_symlinks_and_reports_broken_ones() {
    let dir = site_tree();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("shared.txt"), "shared").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("linked")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert_eq!(backend.file("/site/linked/shared.txt"), Some(&b"shared"[..]));
    assert!(outcome.is_failure());
    let failed: Vec<_> = sink
        .entries()
        .into_iter()
        .filter(|o| o.is_failure())
        .map(|o| o.file)
        .collect();
    assert_eq!(failed, ["/site/dangling"]);
    // siblings still transferred
    assert!(backend.exists("/site/index.html"));
}

#[cfg(unix)]
#[test]
fn upload_root_symlink_is_resolved() {
    let dir = site_tree();
    let links = tempfile::tempdir().unwrap();
    let link = links.path().join("current");
    std::os::unix::fs::symlink(dir.path(), &link).unwrap();

    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(&link, "/site")
        .unwrap();

    assert!(outcome.is_success());
    assert!(backend.exists("/site/css/site.css"));
}

#[test]
fn bulk_upload_stages_filtered_tree() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new().with_tree_transfer(TreeTransfer::Bulk));
    let filter = IgnoreFilter::new(["*.log"]).unwrap();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert!(outcome.is_success());
    assert!(!backend.exists("/site/debug.log"));
    assert!(backend.exists("/site/index.html"));

    // the tree transfer read from a staging copy, not the source
    let staged = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::UploadTree(_)))
        .count();
    assert_eq!(staged, 1);
    assert!(dir.path().join("debug.log").exists());
}

#[test]
fn bulk_upload_without_filter_transfers_everything() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new().with_tree_transfer(TreeTransfer::Bulk));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert_eq!(
        outcome.message.as_deref(),
        Some("3 uploaded, 0 ignored, 0 failed")
    );
}

#[cfg(unix)]
#[test]
fn dangling_link_fails_one_entry_in_both_modes() {
    for mode in [TreeTransfer::PerEntry, TreeTransfer::Bulk] {
        let dir = site_tree();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("a_broken"))
            .unwrap();

        let mut backend = connected(MemoryBackend::new().with_tree_transfer(mode));
        let filter = IgnoreFilter::empty();
        let sink = RecordingEventSink::default();

        let outcome = SyncEngine::new(&mut backend, &filter, &sink)
            .upload(dir.path(), "/site")
            .unwrap();

        assert_eq!(
            outcome.message.as_deref(),
            Some("3 uploaded, 0 ignored, 1 failed"),
            "{mode:?}"
        );
        let failed: Vec<_> = sink
            .entries()
            .into_iter()
            .filter(|o| o.is_failure())
            .collect();
        assert_eq!(failed.len(), 1, "{mode:?}");
        assert_eq!(failed[0].file, "/site/a_broken");
        assert!(failed[0]
            .message
            .as_deref()
            .is_some_and(|m| m.starts_with("broken symlink")));
        assert!(backend.exists("/site/index.html"), "{mode:?}");
    }
}

#[cfg(unix)]
#[test]
fn bulk_upload_skips_symlink_cycles() {
    let dir = site_tree();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("css/loop")).unwrap();

    let mut backend = connected(MemoryBackend::new().with_tree_transfer(TreeTransfer::Bulk));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(
        outcome.message.as_deref(),
        Some("3 uploaded, 1 ignored, 0 failed")
    );
    assert!(!backend.exists("/site/css/loop"));
    let ignored: Vec<_> = sink.entries().into_iter().filter(|o| o.is_ignored()).collect();
    assert_eq!(ignored[0].file, "/site/css/loop");
    assert_eq!(ignored[0].message.as_deref(), Some("symlink cycle not followed"));
}

#[test]
fn bulk_upload_replaces_a_file_occupying_the_root() {
    let dir = site_tree();
    let mut backend = connected(
        MemoryBackend::new()
            .with_tree_transfer(TreeTransfer::Bulk)
            .with_file("/site", "not a dir"),
    );
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .upload(dir.path(), "/site")
        .unwrap();

    assert!(outcome.is_success(), "{outcome:?}");
    assert!(backend.is_dir("/site"));
    assert!(backend.exists("/site/index.html"));
    assert!(backend.calls().contains(&Call::RemoveFile("/site".to_string())));
}

#[test]
fn download_round_trips_an_upload() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("copy");

    let mut engine = SyncEngine::new(&mut backend, &filter, &sink);
    assert!(engine.upload(dir.path(), "/site").unwrap().is_success());
    assert!(engine.download("/site", &target).unwrap().is_success());

    for rel in ["index.html", "debug.log", "css/site.css"] {
        assert_eq!(
            fs::read(dir.path().join(rel)).unwrap(),
            fs::read(target.join(rel)).unwrap(),
            "{rel}"
        );
    }
}

#[test]
fn download_into_a_file_fails_cleanly() {
    let out = tempfile::tempdir().unwrap();
    let occupied = out.path().join("occupied");
    fs::write(&occupied, "x").unwrap();

    let mut backend = connected(MemoryBackend::new().with_file("/site/a.txt", "a"));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .download("/site", &occupied)
        .unwrap();

    assert_eq!(
        outcome.message.as_deref(),
        Some("destination is exist and not a directory")
    );
    assert_eq!(outcome.file, "/site");
    assert_eq!(fs::read_to_string(&occupied).unwrap(), "x");
}

#[test]
fn download_reports_missing_and_symlinked_sources() {
    let out = tempfile::tempdir().unwrap();
    let mut backend = connected(MemoryBackend::new().with_symlink("/site/link", "/etc"));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();
    let mut engine = SyncEngine::new(&mut backend, &filter, &sink);

    let missing = engine.download("/nope", out.path()).unwrap();
    assert_eq!(missing.message.as_deref(), Some("source not exist"));

    let link = engine.download("/site/link", &out.path().join("l")).unwrap();
    assert!(link.is_failure());
    assert!(!out.path().join("l").exists());
}

#[test]
fn download_reports_nested_symlinks_as_ignored() {
    let out = tempfile::tempdir().unwrap();
    let mut backend = connected(
        MemoryBackend::new()
            .with_file("/site/a.txt", "a")
            .with_symlink("/site/link", "/etc"),
    );
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .download("/site", out.path())
        .unwrap();

    assert!(outcome.is_success());
    let ignored: Vec<_> = sink.entries().into_iter().filter(|o| o.is_ignored()).collect();
    assert_eq!(ignored.len(), 1);
    assert_eq!(ignored[0].file, "/site/link");
    assert_eq!(ignored[0].message.as_deref(), Some("symlink not followed"));
}

#[test]
fn nested_symlinks_are_reported_alike_in_both_modes() {
    for mode in [TreeTransfer::PerEntry, TreeTransfer::Bulk] {
        let out = tempfile::tempdir().unwrap();
        let mut backend = connected(
            MemoryBackend::new()
                .with_tree_transfer(mode)
                .with_file("/site/a.txt", "a")
                .with_symlink("/site/link", "/etc"),
        );
        let filter = IgnoreFilter::empty();
        let sink = RecordingEventSink::default();

        let outcome = SyncEngine::new(&mut backend, &filter, &sink)
            .download("/site", out.path())
            .unwrap();

        assert_eq!(
            outcome.message.as_deref(),
            Some("1 downloaded, 1 ignored, 0 failed"),
            "{mode:?}"
        );
        let ignored: Vec<_> = sink.entries().into_iter().filter(|o| o.is_ignored()).collect();
        assert_eq!(ignored.len(), 1, "{mode:?}");
        assert_eq!(ignored[0].file, "/site/link");
        assert_eq!(ignored[0].message.as_deref(), Some("symlink not followed"));
    }
}

#[test]
fn bulk_download_skips_links_under_ignored_directories() {
    let out = tempfile::tempdir().unwrap();
    let mut backend = connected(
        MemoryBackend::new()
            .with_tree_transfer(TreeTransfer::Bulk)
            .with_file("/site/a.txt", "a")
            .with_symlink("/site/cache/link", "/tmp")
            .with_symlink("/site/top", "/etc"),
    );
    let filter = IgnoreFilter::new(["cache"]).unwrap();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .download("/site", out.path())
        .unwrap();

    assert_eq!(
        outcome.message.as_deref(),
        Some("1 downloaded, 2 ignored, 0 failed")
    );
    let mut ignored: Vec<_> = sink
        .entries()
        .into_iter()
        .filter(|o| o.is_ignored())
        .map(|o| o.file)
        .collect();
    ignored.sort();
    assert_eq!(ignored, ["/site/cache", "/site/top"]);
}

#[test]
fn bulk_download_filters_through_staging() {
    let out = tempfile::tempdir().unwrap();
    let mut backend = connected(
        MemoryBackend::new()
            .with_tree_transfer(TreeTransfer::Bulk)
            .with_file("/site/a.txt", "a")
            .with_file("/site/logs/x.log", "x"),
    );
    let filter = IgnoreFilter::new(["logs"]).unwrap();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .download("/site", out.path())
        .unwrap();

    assert_eq!(
        outcome.message.as_deref(),
        Some("1 downloaded, 1 ignored, 0 failed")
    );
    assert!(out.path().join("a.txt").exists());
    assert!(!out.path().join("logs").exists());
}

#[test]
fn move_of_missing_source_has_no_side_effect() {
    let mut backend = connected(MemoryBackend::new().with_dir("/site"));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .rename("/site/a.txt", "/site/new/b.txt")
        .unwrap();

    assert!(!outcome.status);
    assert_eq!(outcome.file, "/site/a.txt");
    assert!(!backend.exists("/site/new"));
    assert!(!backend.calls().iter().any(|c| matches!(c, Call::Rename(..))));
}

#[test]
fn delete_reports_the_kind_removed() {
    let mut backend = connected(
        MemoryBackend::new()
            .with_file("/site/a.txt", "a")
            .with_file("/site/dir/b.txt", "b"),
    );
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();
    let mut engine = SyncEngine::new(&mut backend, &filter, &sink);

    let file = engine.delete("/site/a.txt").unwrap();
    assert_eq!(file.kind, Some(EntryKind::File));

    let dir = engine.delete("/site/dir").unwrap();
    assert!(dir.is_success());
    assert_eq!(dir.kind, Some(EntryKind::Directory));

    let missing = engine.delete("/site/zzz").unwrap();
    assert_eq!(missing.message.as_deref(), Some("source is not exist"));

    assert_eq!(backend.paths(), ["/site"]);
}

#[test]
fn clean_keeps_the_directory_and_ignored_children() {
    let mut backend = connected(
        MemoryBackend::new()
            .with_file("/site/a.txt", "a")
            .with_file("/site/.htaccess", "h")
            .with_file("/site/old/b.txt", "b"),
    );
    let filter = IgnoreFilter::new([".htaccess"]).unwrap();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .clean("/site")
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.message.as_deref(),
        Some("2 removed, 1 ignored, 0 failed")
    );
    assert_eq!(backend.paths(), ["/site", "/site/.htaccess"]);
}

#[test]
fn write_creates_missing_parents() {
    let mut backend = connected(MemoryBackend::new());
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let outcome = SyncEngine::new(&mut backend, &filter, &sink)
        .write("abc123", "/site/meta/.revision")
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(backend.file("/site/meta/.revision"), Some(&b"abc123"[..]));
}

#[test]
fn lost_connection_is_returned_as_error() {
    let dir = site_tree();
    let mut backend = connected(MemoryBackend::new().disconnect_after(2));
    let filter = IgnoreFilter::empty();
    let sink = RecordingEventSink::default();

    let result = SyncEngine::new(&mut backend, &filter, &sink).upload(dir.path(), "/site");

    assert!(matches!(result, Err(BackendError::ConnectionLost(_))));
}
