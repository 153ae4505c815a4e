//! Upload: local file or directory tree to a remote path

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::staging::{copy_filtered, StagingDir};
use super::{non_fatal, read_dir_sorted, settle, SyncEngine, SyncResult, Tally, MATCHES_IGNORE};
use crate::domain::entities::{Outcome, Verb};
use crate::domain::ports::{BackendError, RemoteBackend, TreeTransfer};
use crate::domain::value_objects::{remote_join, to_remote_path};

const VERB: Verb = Verb::Upload;

impl<B: RemoteBackend + ?Sized> SyncEngine<'_, B> {
    /// Upload `local` (file, directory, or symlink to either) to `remote`
    pub fn upload(&mut self, local: &Path, remote: &str) -> SyncResult {
        let link = match fs::symlink_metadata(local) {
            Ok(meta) => meta,
            Err(_) => return Ok(Outcome::failed(VERB, remote, "source not exist")),
        };

        let resolved = if link.file_type().is_symlink() {
            match fs::canonicalize(local) {
                Ok(target) => target,
                Err(e) => {
                    return Ok(Outcome::failed(
                        VERB,
                        remote,
                        format!("broken symlink: {}", e),
                    ))
                }
            }
        } else {
            local.to_path_buf()
        };

        let meta = match fs::metadata(&resolved) {
            Ok(meta) => meta,
            Err(e) => return Ok(Outcome::failed(VERB, remote, e.to_string())),
        };

        if meta.is_dir() {
            self.upload_dir(&resolved, remote)
        } else {
            self.upload_file(&resolved, remote)
        }
    }

    fn upload_file(&mut self, local: &Path, remote: &str) -> SyncResult {
        let result = self
            .ensure_remote_parent(remote)
            .and_then(|_| self.backend.put_file(local, remote));
        settle(result, VERB, remote)
    }

    fn upload_dir(&mut self, local: &Path, remote: &str) -> SyncResult {
        let mut tally = Tally::default();
        match self.backend.tree_transfer() {
            TreeTransfer::PerEntry => {
                if let Err(err) = self.ensure_remote_dir(remote) {
                    return Ok(Outcome::failed(VERB, remote, non_fatal(err)?));
                }
                let mut ancestors = HashSet::new();
                if let Ok(canonical) = fs::canonicalize(local) {
                    ancestors.insert(canonical);
                }
                self.walk_upload(local, Path::new(""), remote, &mut ancestors, &mut tally)?;
            }
            TreeTransfer::Bulk => {
                if let Some(failed) = self.upload_bulk(local, remote, &mut tally)? {
                    return Ok(failed);
                }
            }
        }
        Ok(tally.into_outcome(VERB, remote))
    }

    fn walk_upload(
        &mut self,
        dir: &Path,
        rel: &Path,
        remote_dir: &str,
        ancestors: &mut HashSet<PathBuf>,
        tally: &mut Tally,
    ) -> Result<(), BackendError> {
        let entries = match read_dir_sorted(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.record(tally, Outcome::failed(VERB, remote_dir, e.to_string()));
                return Ok(());
            }
        };

        for entry in entries {
            let name = entry.file_name();
            let child_rel = rel.join(&name);
            let child_remote = remote_join(remote_dir, &name.to_string_lossy());
            let path = entry.path();

            // Follows symlinks; a dangling link fails here
            let meta = match fs::metadata(&path) {
                Ok(meta) => meta,
                Err(e) => {
                    let message = if entry.file_type().is_ok_and(|t| t.is_symlink()) {
                        format!("broken symlink: {}", e)
                    } else {
                        e.to_string()
                    };
                    self.record(tally, Outcome::failed(VERB, child_remote, message));
                    continue;
                }
            };

            if self.filter.matches(&child_rel, meta.is_dir()) {
                debug!(path = %child_rel.display(), "ignored");
                self.record(tally, Outcome::ignored(VERB, child_remote, MATCHES_IGNORE));
                continue;
            }

            if meta.is_dir() {
                let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
                if ancestors.contains(&canonical) {
                    self.record(
                        tally,
                        Outcome::ignored(VERB, child_remote, "symlink cycle not followed"),
                    );
                    continue;
                }
                if let Err(err) = self.ensure_remote_dir(&child_remote) {
                    let message = non_fatal(err)?;
                    self.record(tally, Outcome::failed(VERB, child_remote, message));
                    continue;
                }
                ancestors.insert(canonical.clone());
                let walked = self.walk_upload(&path, &child_rel, &child_remote, ancestors, tally);
                ancestors.remove(&canonical);
                walked?;
            } else {
                let outcome = settle(
                    self.backend.put_file(&path, &child_remote),
                    VERB,
                    &child_remote,
                )?;
                self.record(tally, outcome);
            }
        }
        Ok(())
    }

    /// Whole-tree upload. The local tree is always staged first, so the
    /// backend only sees regular files and directories.
    ///
    /// Returns `Some(outcome)` when the action failed as a whole.
    fn upload_bulk(
        &mut self,
        local: &Path,
        remote: &str,
        tally: &mut Tally,
    ) -> Result<Option<Outcome>, BackendError> {
        if let Err(err) = self.ensure_remote_dir(remote) {
            return Ok(Some(Outcome::failed(VERB, remote, non_fatal(err)?)));
        }

        let staging = match StagingDir::new() {
            Ok(staging) => staging,
            Err(e) => return Ok(Some(Outcome::failed(VERB, remote, e.to_string()))),
        };
        let report = match copy_filtered(local, staging.path(), self.filter) {
            Ok(report) => report,
            Err(e) => return Ok(Some(Outcome::failed(VERB, remote, e.to_string()))),
        };
        debug!(
            staging = %staging.path().display(),
            copied = report.copied.len(),
            skipped = report.skipped.len(),
            "staged local tree"
        );

        for (rel, reason) in &report.skipped {
            let file = remote_join(remote, &to_remote_path(rel));
            self.record(tally, Outcome::ignored(VERB, file, reason.message()));
        }
        for (rel, message) in &report.failed {
            let file = remote_join(remote, &to_remote_path(rel));
            self.record(tally, Outcome::failed(VERB, file, message.clone()));
        }

        match self.backend.upload_tree(staging.path(), remote) {
            Ok(tree) => {
                for file in tree.files {
                    self.record(tally, Outcome::succeeded(VERB, file));
                }
                Ok(None)
            }
            Err(err) => Ok(Some(Outcome::failed(VERB, remote, non_fatal(err)?))),
        }
    }
}
