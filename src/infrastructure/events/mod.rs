//! Event Sink Implementations
//!
//! Provides concrete implementations of DeployEventSink:
//! - JsonEventSink: NDJSON output for CI/automation
//! - ConsoleEventSink: Human-readable progress or GitHub workflow commands

mod console;
mod json;

pub use console::{render_github_outcome, ConsoleEventSink, ConsoleStyle};
pub use json::JsonEventSink;
