//! Deploy Event Port
//!
//! Provides an observable interface for deploy runs.
//! Enables console progress, NDJSON event streams, and CI annotations.

use crate::domain::entities::Outcome;

/// Event emitted during a deploy run
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Session is being opened
    Connecting { endpoint: String, protocol: String },

    /// Connect finished (successfully or not)
    Connected {
        status: bool,
        message: Option<String>,
    },

    /// One transfer inside a directory mirror (or an ignored child)
    Entry { outcome: Outcome },

    /// One compiled action finished
    Action { index: usize, outcome: Outcome },

    /// Remaining actions were skipped after a connection-level failure
    Aborted { index: usize, reason: String },

    /// Session closed
    Closed {
        status: bool,
        message: Option<String>,
    },

    /// Run finished
    Completed {
        succeeded: usize,
        failed: usize,
        ignored: usize,
    },
}

/// Trait for receiving deploy events
///
/// Implementations can be:
/// - ConsoleEventSink: text or GitHub workflow-command output
/// - JsonEventSink: NDJSON event stream
/// - NoopEventSink: Silent operation
pub trait DeployEventSink: Send + Sync {
    /// Handle a deploy event
    fn on_event(&self, event: DeployEvent);

    /// Check if this sink wants per-entry events
    ///
    /// Summary-only sinks skip `Entry` events for large mirrors.
    fn wants_detailed_events(&self) -> bool {
        true
    }
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl DeployEventSink for NoopEventSink {
    fn on_event(&self, _event: DeployEvent) {}

    fn wants_detailed_events(&self) -> bool {
        false
    }
}
