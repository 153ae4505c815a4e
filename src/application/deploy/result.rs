//! Deploy Result
//!
//! The report every run produces, whatever happened.

use crate::domain::entities::Outcome;

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployPhase {
    #[default]
    Idle,
    Connecting,
    Connected,
    Executing,
    Closing,
    Done,
    Failed,
}

/// Result of a deploy run
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    /// Whether the session was established
    pub connected: bool,
    /// Why connecting failed
    pub connect_error: Option<String>,
    /// One outcome per executed action, in batch order
    pub outcomes: Vec<Outcome>,
    /// Set when a connection-level failure stopped the batch early
    pub aborted: Option<String>,
    /// Error from tearing the session down
    pub close_error: Option<String>,
    pub phase: DeployPhase,
}

impl DeployReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connected, not aborted, and no action failed
    pub fn is_success(&self) -> bool {
        self.connected && self.aborted.is_none() && self.failed() == 0
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn ignored(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ignored()).count()
    }
}
