//! Action compiler
//!
//! Turns raw action input into an ordered, validated `ActionBatch`.
//! Pure: no I/O, no network. Every violation is a descriptive error; nothing is
//! silently dropped.

use std::fmt;
use thiserror::Error;

use super::change_set::compile_json;
use super::tokenizer::{tokenize, TokenizeError};
use crate::domain::entities::{ActionBatch, TransferOperation, Verb};
use crate::domain::value_objects::{remote_join, LocalScope};

/// Where an invalid command came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 1-based line of command text
    Line(usize),
    /// 0-based index into a JSON array
    Item(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line(n) => write!(f, "line {}", n),
            Location::Item(n) => write!(f, "item {}", n),
        }
    }
}

/// Compilation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("invalid JSON input: {0}")]
    InvalidJson(String),

    #[error("expected a change-set object or an array, found {0}")]
    UnexpectedJson(&'static str),

    #[error("change-set object has no \"files\" list")]
    MissingFiles,

    #[error("item {index}: {message}")]
    InvalidItem { index: usize, message: String },

    #[error("item {index}: unknown change status '{status}'")]
    UnknownStatus { index: usize, status: String },

    #[error("{location}: {message}")]
    Syntax { location: Location, message: String },

    #[error("{location}: unknown verb '{verb}' (expected one of: {})", known_verbs())]
    UnknownVerb { location: Location, verb: String },

    #[error("{location}: '{verb}' takes {expected} argument(s), got {found}")]
    WrongArity {
        location: Location,
        verb: Verb,
        expected: usize,
        found: usize,
    },
}

fn known_verbs() -> String {
    Verb::ALL
        .iter()
        .map(Verb::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compile raw action input.
///
/// Input that starts with `{` or `[` is a JSON change-set; anything else is
/// newline-delimited command text (`verb arg...`, `#` comments).
pub fn compile(
    raw: &str,
    remote_root: &str,
    scope: &LocalScope,
) -> Result<ActionBatch, CompileError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return compile_json(trimmed, remote_root, scope);
    }
    compile_commands(raw, remote_root)
}

fn compile_commands(raw: &str, remote_root: &str) -> Result<ActionBatch, CompileError> {
    let mut batch = ActionBatch::new();

    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let location = Location::Line(idx + 1);
        let tokens = tokenize(line).map_err(|e| CompileError::Syntax {
            location,
            message: match e {
                TokenizeError::UnterminatedQuote(q) => format!("unterminated {} quote", q),
                TokenizeError::TrailingEscape => "trailing backslash".to_string(),
            },
        })?;

        batch.push(command_to_operation(tokens, location, remote_root)?);
    }

    Ok(batch)
}

/// Validate `[verb, args...]` and build the operation
pub(super) fn command_to_operation(
    tokens: Vec<String>,
    location: Location,
    remote_root: &str,
) -> Result<TransferOperation, CompileError> {
    let mut tokens = tokens.into_iter();
    let name = tokens.next().unwrap_or_default();
    let verb: Verb = name
        .parse()
        .map_err(|_| CompileError::UnknownVerb {
            location,
            verb: name.clone(),
        })?;

    let args: Vec<String> = tokens.collect();
    if args.len() != verb.arity() {
        return Err(CompileError::WrongArity {
            location,
            verb,
            expected: verb.arity(),
            found: args.len(),
        });
    }

    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or_default();
    let remote = |path: String| resolve_remote(remote_root, path);

    Ok(match verb {
        Verb::Upload => {
            let local = next();
            TransferOperation::upload(local, remote(next()))
        }
        Verb::Download => {
            let src = remote(next());
            TransferOperation::download(src, next())
        }
        Verb::Write => {
            let content = next();
            TransferOperation::write(content, remote(next()))
        }
        Verb::Move => {
            let from = remote(next());
            TransferOperation::rename(from, remote(next()))
        }
        Verb::Delete => TransferOperation::delete(remote(next())),
        Verb::Clean => TransferOperation::clean(remote(next())),
    })
}

/// Absolute remote paths are kept verbatim; relative ones join the root
fn resolve_remote(remote_root: &str, path: String) -> String {
    if path.starts_with('/') {
        path
    } else {
        remote_join(remote_root, &path)
    }
}
