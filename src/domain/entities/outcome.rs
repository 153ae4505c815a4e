//! Outcome of an action or of one transfer inside a directory mirror

use serde::Serialize;

use super::operation::Verb;
use crate::domain::value_objects::EntryKind;

/// `{ verb, file, status, message?, ignored?, type? }`
///
/// The only observable contract toward reporting. "Ignored" is a distinct
/// state: `status` is false but the item did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub verb: Verb,
    pub file: String,
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
    /// Kind of node affected (set by deletes)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
}

impl Outcome {
    pub fn succeeded(verb: Verb, file: impl Into<String>) -> Self {
        Self {
            verb,
            file: file.into(),
            status: true,
            message: None,
            ignored: false,
            kind: None,
        }
    }

    pub fn failed(verb: Verb, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            verb,
            file: file.into(),
            status: false,
            message: Some(message.into()),
            ignored: false,
            kind: None,
        }
    }

    pub fn ignored(verb: Verb, file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            verb,
            file: file.into(),
            status: false,
            message: Some(reason.into()),
            ignored: true,
            kind: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status
    }

    pub fn is_failure(&self) -> bool {
        !self.status && !self.ignored
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }
}
