//! Remote-only operations: write, move, delete, clean, and directory
//! preparation shared by the transfers.

use tracing::debug;

use super::{non_fatal, settle, SyncEngine, SyncResult, Tally, MATCHES_IGNORE};
use crate::domain::entities::{Outcome, Verb};
use crate::domain::ports::{BackendResult, RemoteBackend};
use crate::domain::value_objects::{remote_join, remote_parent, EntryKind};
use std::path::Path;

impl<B: RemoteBackend + ?Sized> SyncEngine<'_, B> {
    /// Make sure `path` is a remote directory.
    ///
    /// Idempotent; a non-directory occupant is removed first.
    pub(super) fn ensure_remote_dir(&mut self, path: &str) -> BackendResult<()> {
        match self.backend.probe(path).kind {
            EntryKind::Directory => Ok(()),
            EntryKind::Absent => self.backend.make_directory(path, true),
            EntryKind::File | EntryKind::Symlink => {
                debug!(path, "replacing non-directory with a directory");
                self.backend.remove_file(path)?;
                self.backend.make_directory(path, true)
            }
        }
    }

    pub(super) fn ensure_remote_parent(&mut self, path: &str) -> BackendResult<()> {
        match remote_parent(path) {
            Some(parent) => self.ensure_remote_dir(parent),
            None => Ok(()),
        }
    }

    /// Upload in-memory content
    pub fn write(&mut self, content: &str, remote: &str) -> SyncResult {
        let result = self
            .ensure_remote_parent(remote)
            .and_then(|_| self.backend.put_bytes(content.as_bytes(), remote));
        settle(result, Verb::Write, remote)
    }

    /// Rename a remote path. A missing source fails without side effects.
    pub fn rename(&mut self, from: &str, to: &str) -> SyncResult {
        if !self.backend.probe(from).exists() {
            return Ok(Outcome::failed(Verb::Move, from, "source not exists"));
        }
        let result = self
            .ensure_remote_parent(to)
            .and_then(|_| self.backend.rename(from, to));
        settle(result, Verb::Move, from)
    }

    /// Remove a remote file, symlink or directory tree
    pub fn delete(&mut self, remote: &str) -> SyncResult {
        let kind = self.backend.probe(remote).kind;
        if kind == EntryKind::Absent {
            return Ok(Outcome::failed(Verb::Delete, remote, "source is not exist"));
        }
        let outcome = settle(self.remove_entry(remote, kind), Verb::Delete, remote)?;
        Ok(outcome.with_kind(kind))
    }

    /// Remove the contents of a remote directory, keeping the directory and
    /// any child the ignore filter matches
    pub fn clean(&mut self, remote: &str) -> SyncResult {
        match self.backend.probe(remote).kind {
            EntryKind::Directory => {}
            EntryKind::Absent => {
                return Ok(Outcome::failed(Verb::Clean, remote, "source is not exist"))
            }
            _ => return Ok(Outcome::failed(Verb::Clean, remote, "not a directory")),
        }

        let mut children = match self.backend.list_children(remote) {
            Ok(children) => children,
            Err(err) => return Ok(Outcome::failed(Verb::Clean, remote, non_fatal(err)?)),
        };
        children.sort_by(|a, b| a.name.cmp(&b.name));

        let mut tally = Tally::default();
        for child in children {
            let path = remote_join(remote, &child.name);
            if self.filter.matches(Path::new(&child.name), child.kind.is_dir()) {
                self.record(&mut tally, Outcome::ignored(Verb::Clean, path, MATCHES_IGNORE));
                continue;
            }
            let outcome = settle(self.remove_entry(&path, child.kind), Verb::Clean, &path)?;
            self.record(&mut tally, outcome.with_kind(child.kind));
        }
        Ok(tally.into_outcome(Verb::Clean, remote))
    }

    fn remove_entry(&mut self, path: &str, kind: EntryKind) -> BackendResult<()> {
        if kind.is_dir() {
            self.backend.remove_directory(path, true)
        } else {
            self.backend.remove_file(path)
        }
    }
}
