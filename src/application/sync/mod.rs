//! Directory Sync Engine
//!
//! Executes one operation against a backend: mirrors directory trees (upload
//! or download), transfers single files, and runs the remote-only verbs.
//!
//! Every method returns `Ok(outcome)` for anything that should not stop the
//! batch, including per-item failures. `Err` is reserved for connection-level
//! failures (`BackendError::is_fatal`).

mod download;
mod remote_ops;
mod staging;
mod upload;

use std::fs::{self, DirEntry};
use std::io;
use std::path::Path;

use crate::domain::entities::{Outcome, Verb};
use crate::domain::ports::{BackendError, DeployEvent, DeployEventSink, RemoteBackend};
use crate::domain::value_objects::IgnoreFilter;

pub use staging::{copy_filtered, CopyReport, SkipReason, StagingDir};

/// Result of one engine call
pub type SyncResult = Result<Outcome, BackendError>;

pub(crate) const MATCHES_IGNORE: &str = "matches ignore pattern";

/// Per-action counters for directory mirrors
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub transferred: usize,
    pub ignored: usize,
    pub failed: usize,
}

impl Tally {
    fn add(&mut self, outcome: &Outcome) {
        if outcome.is_success() {
            self.transferred += 1;
        } else if outcome.is_ignored() {
            self.ignored += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Summarize into the action outcome; succeeds iff no entry failed
    pub fn into_outcome(self, verb: Verb, file: impl Into<String>) -> Outcome {
        let done = match verb {
            Verb::Clean | Verb::Delete => "removed",
            Verb::Download => "downloaded",
            _ => "uploaded",
        };
        let message = format!(
            "{} {}, {} ignored, {} failed",
            self.transferred, done, self.ignored, self.failed
        );
        let mut outcome = Outcome::succeeded(verb, file).with_message(message);
        outcome.status = self.failed == 0;
        outcome
    }
}

/// Sync engine bound to one backend, filter and event sink
pub struct SyncEngine<'a, B: RemoteBackend + ?Sized> {
    backend: &'a mut B,
    filter: &'a IgnoreFilter,
    events: &'a dyn DeployEventSink,
}

impl<'a, B: RemoteBackend + ?Sized> SyncEngine<'a, B> {
    pub fn new(
        backend: &'a mut B,
        filter: &'a IgnoreFilter,
        events: &'a dyn DeployEventSink,
    ) -> Self {
        Self {
            backend,
            filter,
            events,
        }
    }

    /// Count an entry outcome and report it
    fn record(&self, tally: &mut Tally, outcome: Outcome) {
        tally.add(&outcome);
        if self.events.wants_detailed_events() {
            self.events.on_event(DeployEvent::Entry { outcome });
        }
    }
}

/// Split a backend error into "stop the batch" or a message for a failed
/// outcome
fn non_fatal(err: BackendError) -> Result<String, BackendError> {
    if err.is_fatal() {
        Err(err)
    } else {
        Ok(err.to_string())
    }
}

/// Success, a failed outcome, or a fatal error
fn settle<T>(result: Result<T, BackendError>, verb: Verb, file: &str) -> SyncResult {
    match result {
        Ok(_) => Ok(Outcome::succeeded(verb, file)),
        Err(err) => Ok(Outcome::failed(verb, file, non_fatal(err)?)),
    }
}

/// Directory entries in name order
fn read_dir_sorted(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(DirEntry::file_name);
    Ok(entries)
}

#[cfg(test)]
mod tests;
