//! Deploy Options
//!
//! Per-run rules the driver applies to every operation.

use std::path::Path;

use crate::application::sync::MATCHES_IGNORE;
use crate::domain::entities::{TransferOperation, Verb};
use crate::domain::value_objects::{IgnoreFilter, LocalScope};

pub(crate) const OUTSIDE_LOCAL_PATH: &str = "outside local path";

/// Options for the deploy use case
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Local root every local source must lie under
    pub local_scope: LocalScope,
    /// Exclusion patterns, applied per action and per directory entry
    pub ignore: IgnoreFilter,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: LocalScope) -> Self {
        self.local_scope = scope;
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = ignore;
        self
    }

    /// Why an operation is skipped as a whole, if it is.
    ///
    /// Operations derived from local files (both sides of a rename) are
    /// matched by their paths relative to the scope; everything else by its
    /// source. `write` carries content, not a path, and is never skipped.
    pub fn skip_reason(&self, operation: &TransferOperation) -> Option<&'static str> {
        if operation.verb == Verb::Write {
            return None;
        }

        if operation.origin().is_none() {
            let source = Path::new(&operation.source);
            return self.ignore.matches(source, false).then_some(MATCHES_IGNORE);
        }

        let mut reason = None;
        for origin in operation.origins() {
            let Some(rel) = self.local_scope.relative(origin) else {
                return Some(OUTSIDE_LOCAL_PATH);
            };
            if self.ignore.matches(&rel, origin.is_dir()) {
                reason = Some(MATCHES_IGNORE);
            }
        }
        reason
    }
}
