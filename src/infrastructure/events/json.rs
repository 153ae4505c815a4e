//! JSON Event Sink
//!
//! Outputs deploy events as NDJSON for CI/automation consumption.

use crate::domain::entities::Outcome;
use crate::domain::ports::{DeployEvent, DeployEventSink};
use std::io::{self, Write};
use std::sync::Mutex;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Mutex to ensure thread-safe writes
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Create a JSON event sink writing to a custom writer
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, mut event: serde_json::Value) {
        if let Some(map) = event.as_object_mut() {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

fn outcome_value(outcome: &Outcome) -> serde_json::Value {
    serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null)
}

impl DeployEventSink for JsonEventSink {
    fn on_event(&self, event: DeployEvent) {
        let json = match event {
            DeployEvent::Connecting { endpoint, protocol } => {
                serde_json::json!({
                    "event": "connecting",
                    "command": "deploy",
                    "endpoint": endpoint,
                    "protocol": protocol,
                })
            }

            DeployEvent::Connected { status, message } => {
                serde_json::json!({
                    "event": "connected",
                    "command": "deploy",
                    "status": status,
                    "message": message,
                })
            }

            DeployEvent::Entry { outcome } => {
                serde_json::json!({
                    "event": "entry",
                    "command": "deploy",
                    "outcome": outcome_value(&outcome),
                })
            }

            DeployEvent::Action { index, outcome } => {
                serde_json::json!({
                    "event": "action",
                    "command": "deploy",
                    "index": index,
                    "outcome": outcome_value(&outcome),
                })
            }

            DeployEvent::Aborted { index, reason } => {
                serde_json::json!({
                    "event": "aborted",
                    "command": "deploy",
                    "index": index,
                    "reason": reason,
                })
            }

            DeployEvent::Closed { status, message } => {
                serde_json::json!({
                    "event": "closed",
                    "command": "deploy",
                    "status": status,
                    "message": message,
                })
            }

            DeployEvent::Completed {
                succeeded,
                failed,
                ignored,
            } => {
                let status = if failed == 0 { "success" } else { "partial" };
                serde_json::json!({
                    "event": "complete",
                    "command": "deploy",
                    "status": status,
                    "succeeded": succeeded,
                    "failed": failed,
                    "ignored": ignored,
                })
            }
        };

        self.write_event(json);
    }

    fn wants_detailed_events(&self) -> bool {
        true // JSON mode wants all events
    }
}
