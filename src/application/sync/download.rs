//! Download: remote file or directory tree to a local path

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::staging::{copy_filtered, StagingDir};
use super::{non_fatal, SyncEngine, SyncResult, Tally, MATCHES_IGNORE};
use crate::domain::entities::{Outcome, Verb};
use crate::domain::ports::{BackendError, RemoteBackend, TreeTransfer};
use crate::domain::value_objects::{remote_join, to_remote_path, EntryKind};

const VERB: Verb = Verb::Download;
const SYMLINK_NOT_FOLLOWED: &str = "symlink not followed";

/// Why a single download failed
enum FetchError {
    Local(io::Error),
    Remote(BackendError),
}

impl<B: RemoteBackend + ?Sized> SyncEngine<'_, B> {
    /// Download `remote` (file or directory) to `local`. Remote symlinks are
    /// never followed.
    pub fn download(&mut self, remote: &str, local: &Path) -> SyncResult {
        match self.backend.probe(remote).kind {
            EntryKind::Absent => Ok(Outcome::failed(VERB, remote, "source not exist")),
            EntryKind::Symlink => Ok(Outcome::failed(
                VERB,
                remote,
                "source is a symlink, not followed",
            )),
            EntryKind::File => self.download_file(remote, local),
            EntryKind::Directory => self.download_dir(remote, local),
        }
    }

    fn download_file(&mut self, remote: &str, local: &Path) -> SyncResult {
        if let Err(e) = ensure_local_parent(local) {
            return Ok(Outcome::failed(VERB, remote, e.to_string()));
        }
        match self.fetch(remote, local) {
            Ok(()) => Ok(Outcome::succeeded(VERB, remote)),
            Err(FetchError::Local(e)) => Ok(Outcome::failed(VERB, remote, e.to_string())),
            Err(FetchError::Remote(err)) => Ok(Outcome::failed(VERB, remote, non_fatal(err)?)),
        }
    }

    /// Stream one remote file into a new local file. Completion means flushed
    /// and synced; a partial file is removed.
    fn fetch(&mut self, remote: &str, local: &Path) -> Result<(), FetchError> {
        let file = create_local_file(local).map_err(FetchError::Local)?;
        let mut writer = BufWriter::new(file);

        let result = match self.backend.get_file(remote, &mut writer) {
            Ok(bytes) => {
                debug!(remote, bytes, "downloaded");
                writer
                    .flush()
                    .and_then(|_| writer.get_ref().sync_all())
                    .map_err(FetchError::Local)
            }
            Err(err) => Err(FetchError::Remote(err)),
        };

        if result.is_err() {
            drop(writer);
            let _ = fs::remove_file(local);
        }
        result
    }

    fn download_dir(&mut self, remote: &str, local: &Path) -> SyncResult {
        match fs::metadata(local) {
            Ok(meta) if !meta.is_dir() => {
                return Ok(Outcome::failed(
                    VERB,
                    remote,
                    "destination is exist and not a directory",
                ))
            }
            Ok(_) => {}
            Err(_) => {
                if let Err(e) = create_local_dir(local) {
                    return Ok(Outcome::failed(VERB, remote, e.to_string()));
                }
            }
        }

        let mut tally = Tally::default();
        match self.backend.tree_transfer() {
            TreeTransfer::PerEntry => {
                self.walk_download(remote, Path::new(""), local, &mut tally)?;
            }
            TreeTransfer::Bulk => {
                if let Some(failed) = self.download_bulk(remote, local, &mut tally)? {
                    return Ok(failed);
                }
            }
        }
        Ok(tally.into_outcome(VERB, remote))
    }

    fn walk_download(
        &mut self,
        remote_dir: &str,
        rel: &Path,
        local_dir: &Path,
        tally: &mut Tally,
    ) -> Result<(), BackendError> {
        let mut children = match self.backend.list_children(remote_dir) {
            Ok(children) => children,
            Err(err) => {
                let message = non_fatal(err)?;
                self.record(tally, Outcome::failed(VERB, remote_dir, message));
                return Ok(());
            }
        };
        children.sort_by(|a, b| a.name.cmp(&b.name));

        for child in children {
            let child_remote = remote_join(remote_dir, &child.name);
            let child_rel = rel.join(&child.name);
            let child_local = local_dir.join(&child.name);

            if self.filter.matches(&child_rel, child.kind.is_dir()) {
                self.record(tally, Outcome::ignored(VERB, child_remote, MATCHES_IGNORE));
                continue;
            }

            match child.kind {
                EntryKind::Symlink => {
                    self.record(
                        tally,
                        Outcome::ignored(VERB, child_remote, SYMLINK_NOT_FOLLOWED),
                    );
                }
                EntryKind::Directory => {
                    if let Err(e) = ensure_local_dir(&child_local) {
                        self.record(tally, Outcome::failed(VERB, child_remote, e.to_string()));
                        continue;
                    }
                    self.walk_download(&child_remote, &child_rel, &child_local, tally)?;
                }
                EntryKind::File => {
                    let outcome = match self.fetch(&child_remote, &child_local) {
                        Ok(()) => Outcome::succeeded(VERB, child_remote),
                        Err(FetchError::Local(e)) => {
                            Outcome::failed(VERB, child_remote, e.to_string())
                        }
                        Err(FetchError::Remote(err)) => {
                            let message = non_fatal(err)?;
                            Outcome::failed(VERB, child_remote, message)
                        }
                    };
                    self.record(tally, outcome);
                }
                EntryKind::Absent => {}
            }
        }
        Ok(())
    }

    /// Whole-tree download; filtered trees go through a staging directory
    fn download_bulk(
        &mut self,
        remote: &str,
        local: &Path,
        tally: &mut Tally,
    ) -> Result<Option<Outcome>, BackendError> {
        if self.filter.is_empty() {
            return match self.backend.download_tree(remote, local) {
                Ok(tree) => {
                    self.record_skipped_symlinks(remote, &tree.symlinks, tally);
                    for file in tree.files {
                        self.record(tally, Outcome::succeeded(VERB, file));
                    }
                    Ok(None)
                }
                Err(err) => Ok(Some(Outcome::failed(VERB, remote, non_fatal(err)?))),
            };
        }

        let staging = match StagingDir::new() {
            Ok(staging) => staging,
            Err(e) => return Ok(Some(Outcome::failed(VERB, remote, e.to_string()))),
        };
        let tree = match self.backend.download_tree(remote, staging.path()) {
            Ok(tree) => tree,
            Err(err) => return Ok(Some(Outcome::failed(VERB, remote, non_fatal(err)?))),
        };
        let report = match copy_filtered(staging.path(), local, self.filter) {
            Ok(report) => report,
            Err(e) => return Ok(Some(Outcome::failed(VERB, remote, e.to_string()))),
        };

        self.record_skipped_symlinks(remote, &tree.symlinks, tally);
        for (rel, reason) in &report.skipped {
            let file = remote_join(remote, &to_remote_path(rel));
            self.record(tally, Outcome::ignored(VERB, file, reason.message()));
        }
        for (rel, message) in &report.failed {
            let file = remote_join(remote, &to_remote_path(rel));
            self.record(tally, Outcome::failed(VERB, file, message.clone()));
        }
        for rel in &report.copied {
            let file = remote_join(remote, &to_remote_path(rel));
            self.record(tally, Outcome::succeeded(VERB, file));
        }
        Ok(None)
    }

    /// Report remote symlinks a tree download left behind, the way the
    /// per-entry walk does. Links under an ignored directory are not
    /// mentioned; that directory is reported instead.
    fn record_skipped_symlinks(&mut self, remote: &str, symlinks: &[String], tally: &mut Tally) {
        let prefix = format!("{}/", remote.trim_end_matches('/'));
        for link in symlinks {
            let rel = Path::new(link.strip_prefix(&prefix).unwrap_or(link));
            let under_ignored_dir = rel
                .ancestors()
                .skip(1)
                .filter(|dir| !dir.as_os_str().is_empty())
                .any(|dir| self.filter.matches(dir, true));
            if under_ignored_dir {
                continue;
            }
            let reason = if self.filter.matches(rel, false) {
                MATCHES_IGNORE
            } else {
                SYMLINK_NOT_FOLLOWED
            };
            self.record(tally, Outcome::ignored(VERB, link.clone(), reason));
        }
    }
}

/// Create a directory tree with mode 0755 on unix
fn create_local_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

/// Make `path` a directory, replacing a non-directory occupant
fn ensure_local_dir(path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => {
            fs::remove_file(path)?;
            create_local_dir(path)
        }
        Err(_) => create_local_dir(path),
    }
}

fn ensure_local_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_local_dir(parent),
        _ => Ok(()),
    }
}

/// Create (or truncate) a file with mode 0644 on unix
fn create_local_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}
