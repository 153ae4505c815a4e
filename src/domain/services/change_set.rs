//! Structured change-set input
//!
//! Two JSON shapes are accepted:
//! - an object `{ "files": [...], "sha"|"revision"|"after": "<id>" }` where
//!   each file carries a `status` (the shape of a commit's file list)
//! - an array of paths, `{filename|path}` objects or pre-tokenized commands

use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use super::compiler::{command_to_operation, CompileError, Location};
use crate::domain::entities::{ActionBatch, TransferOperation};
use crate::domain::value_objects::{normalize_local, remote_join, to_remote_path, LocalScope};

/// Remote file that records the deployed revision
pub const REVISION_FILE: &str = ".revision";

#[derive(Debug, Deserialize)]
struct ChangeSet {
    files: Option<Vec<Value>>,
    #[serde(default, alias = "sha", alias = "after")]
    revision: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChangedFile {
    #[serde(alias = "path")]
    filename: String,
    status: String,
    #[serde(default, alias = "previous_path")]
    previous_filename: Option<String>,
    #[serde(default)]
    changes: u64,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    patch: Option<String>,
}

impl ChangedFile {
    fn has_content_changes(&self) -> bool {
        self.changes > 0
            || self.additions > 0
            || self.deletions > 0
            || self.patch.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// What a change status compiles to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeKind {
    Upload,
    Remove,
    Rename,
    Unchanged,
}

impl ChangeKind {
    fn parse(status: &str) -> Option<Self> {
        match status {
            "added" | "modified" | "changed" | "copied" => Some(Self::Upload),
            "removed" => Some(Self::Remove),
            "renamed" => Some(Self::Rename),
            "unchanged" => Some(Self::Unchanged),
            _ => None,
        }
    }
}

/// Compile a JSON document. `raw` is already known to start with `{` or `[`.
pub(super) fn compile_json(
    raw: &str,
    remote_root: &str,
    scope: &LocalScope,
) -> Result<ActionBatch, CompileError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CompileError::InvalidJson(e.to_string()))?;

    match value {
        Value::Object(_) => compile_change_set(value, remote_root, scope),
        Value::Array(items) => compile_list(items, remote_root, scope),
        other => Err(CompileError::UnexpectedJson(json_kind(&other))),
    }
}

fn compile_change_set(
    value: Value,
    remote_root: &str,
    scope: &LocalScope,
) -> Result<ActionBatch, CompileError> {
    let change_set: ChangeSet =
        serde_json::from_value(value).map_err(|e| CompileError::InvalidJson(e.to_string()))?;
    let files = change_set.files.ok_or(CompileError::MissingFiles)?;

    let mut batch = ActionBatch::new();
    for (index, item) in files.into_iter().enumerate() {
        let file: ChangedFile =
            serde_json::from_value(item).map_err(|e| CompileError::InvalidItem {
                index,
                message: e.to_string(),
            })?;

        let kind = ChangeKind::parse(&file.status).ok_or_else(|| CompileError::UnknownStatus {
            index,
            status: file.status.clone(),
        })?;

        let target = remote_for(&file.filename, remote_root, scope);
        match kind {
            ChangeKind::Upload => batch.push(TransferOperation::upload(&file.filename, target)),
            ChangeKind::Remove => {
                batch.push(TransferOperation::delete(target).with_origin(&file.filename))
            }
            ChangeKind::Rename if file.has_content_changes() => {
                batch.push(TransferOperation::upload(&file.filename, target))
            }
            ChangeKind::Rename => {
                let previous =
                    file.previous_filename
                        .as_deref()
                        .ok_or_else(|| CompileError::InvalidItem {
                            index,
                            message: "renamed entry has no previous_filename".to_string(),
                        })?;
                let from = remote_for(previous, remote_root, scope);
                batch.push(
                    TransferOperation::rename(from, target)
                        .with_origin(&file.filename)
                        .with_previous_origin(previous),
                );
            }
            ChangeKind::Unchanged => {}
        }
    }

    if let Some(revision) = change_set.revision.filter(|r| !r.is_empty()) {
        batch.push(TransferOperation::write(
            revision,
            remote_join(remote_root, REVISION_FILE),
        ));
    }

    Ok(batch)
}

fn compile_list(
    items: Vec<Value>,
    remote_root: &str,
    scope: &LocalScope,
) -> Result<ActionBatch, CompileError> {
    let mut batch = ActionBatch::new();
    for (index, item) in items.into_iter().enumerate() {
        let operation = match item {
            Value::String(path) => {
                let target = remote_for(&path, remote_root, scope);
                TransferOperation::upload(path, target)
            }
            Value::Object(mut map) => {
                let path = map
                    .remove("filename")
                    .or_else(|| map.remove("path"))
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or_else(|| CompileError::InvalidItem {
                        index,
                        message: "object has no string \"filename\" or \"path\"".to_string(),
                    })?;
                let target = remote_for(&path, remote_root, scope);
                TransferOperation::upload(path, target)
            }
            Value::Array(words) => {
                let tokens = words
                    .into_iter()
                    .map(|w| match w {
                        Value::String(s) => Ok(s),
                        other => Err(CompileError::InvalidItem {
                            index,
                            message: format!(
                                "command words must be strings, found {}",
                                json_kind(&other)
                            ),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                command_to_operation(tokens, Location::Item(index), remote_root)?
            }
            other => {
                return Err(CompileError::InvalidItem {
                    index,
                    message: format!("unexpected {}", json_kind(&other)),
                })
            }
        };
        batch.push(operation);
    }
    Ok(batch)
}

/// Remote path for a local change-set path.
///
/// The path is made relative to the scope; a path outside the scope keeps its
/// full relative form and is reported as ignored later.
fn remote_for(local: &str, remote_root: &str, scope: &LocalScope) -> String {
    let local = Path::new(local);
    let rel = scope
        .relative(local)
        .unwrap_or_else(|| normalize_local(local));
    remote_join(remote_root, &to_remote_path(&rel))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
