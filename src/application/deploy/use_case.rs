//! Deploy Use Case
//!
//! Runs a compiled `ActionBatch` against one backend:
//! 1. Connect (failure is reported, nothing runs, nothing is closed)
//! 2. For each operation, in order: capability check, scope and ignore
//!    rules, dispatch to the sync engine, one action outcome
//! 3. Close exactly once
//!
//! Per-action failures never stop the batch. A connection-level failure
//! records the current action as failed and skips the rest.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::sync::{SyncEngine, SyncResult};
use crate::domain::entities::{ActionBatch, Outcome, TransferOperation, Verb};
use crate::domain::ports::{DeployEvent, DeployEventSink, NoopEventSink, RemoteBackend};
use crate::domain::value_objects::Endpoint;

use super::options::DeployOptions;
use super::result::{DeployPhase, DeployReport};

/// Deploy use case - drives one backend through one batch
pub struct DeployUseCase<B: RemoteBackend> {
    backend: B,
    phase: DeployPhase,
}

impl<B: RemoteBackend> DeployUseCase<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            phase: DeployPhase::Idle,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn phase(&self) -> DeployPhase {
        self.phase
    }

    /// Execute the batch without event reporting
    pub fn execute(
        &mut self,
        endpoint: &Endpoint,
        batch: &ActionBatch,
        options: &DeployOptions,
    ) -> DeployReport {
        self.execute_with_events(endpoint, batch, options, Arc::new(NoopEventSink))
    }

    /// Execute the batch, reporting progress to `events`
    pub fn execute_with_events(
        &mut self,
        endpoint: &Endpoint,
        batch: &ActionBatch,
        options: &DeployOptions,
        events: Arc<dyn DeployEventSink>,
    ) -> DeployReport {
        let mut report = DeployReport::new();

        self.transition(DeployPhase::Connecting);
        events.on_event(DeployEvent::Connecting {
            endpoint: endpoint.display_name(),
            protocol: self.backend.protocol().to_string(),
        });

        let connect = self.backend.connect(endpoint);
        events.on_event(DeployEvent::Connected {
            status: connect.ok,
            message: connect.message.clone(),
        });
        if !connect.ok {
            report.connect_error = Some(
                connect
                    .message
                    .unwrap_or_else(|| "connection failed".to_string()),
            );
            self.transition(DeployPhase::Failed);
            report.phase = self.phase;
            emit_completed(&report, events.as_ref());
            return report;
        }
        report.connected = true;
        self.transition(DeployPhase::Connected);

        self.transition(DeployPhase::Executing);
        for (index, operation) in batch.iter().enumerate() {
            debug!(index, %operation, "executing");
            match self.run_operation(operation, options, events.as_ref()) {
                Ok(outcome) => {
                    report.outcomes.push(outcome.clone());
                    events.on_event(DeployEvent::Action { index, outcome });
                }
                Err(err) => {
                    let reason = err.to_string();
                    warn!(index, %reason, "aborting batch");
                    let outcome = Outcome::failed(operation.verb, operation.file(), &reason);
                    report.outcomes.push(outcome.clone());
                    events.on_event(DeployEvent::Action { index, outcome });
                    events.on_event(DeployEvent::Aborted {
                        index,
                        reason: reason.clone(),
                    });
                    report.aborted = Some(reason);
                    break;
                }
            }
        }

        self.transition(DeployPhase::Closing);
        let closed = self.backend.close();
        if let Err(err) = &closed {
            report.close_error = Some(err.to_string());
        }
        events.on_event(DeployEvent::Closed {
            status: closed.is_ok(),
            message: report.close_error.clone(),
        });

        self.transition(if report.aborted.is_some() {
            DeployPhase::Failed
        } else {
            DeployPhase::Done
        });
        report.phase = self.phase;
        emit_completed(&report, events.as_ref());
        report
    }

    fn transition(&mut self, next: DeployPhase) {
        debug!(from = ?self.phase, to = ?next, "deploy phase");
        self.phase = next;
    }

    fn run_operation(
        &mut self,
        operation: &TransferOperation,
        options: &DeployOptions,
        events: &dyn DeployEventSink,
    ) -> SyncResult {
        let verb = operation.verb;
        let file = operation.file();

        if !self.backend.supports(verb) {
            warn!(%verb, backend = self.backend.protocol(), "verb not supported");
            return Ok(Outcome::failed(
                verb,
                file,
                format!("{} is not supported by the {} backend", verb, self.backend.protocol()),
            ));
        }

        if let Some(reason) = options.skip_reason(operation) {
            debug!(%verb, file, reason, "skipped");
            return Ok(Outcome::ignored(verb, file, reason));
        }

        let mut engine = SyncEngine::new(&mut self.backend, &options.ignore, events);
        let destination = operation.destination().unwrap_or_default();
        match verb {
            Verb::Upload => engine.upload(Path::new(&operation.source), destination),
            Verb::Download => engine.download(&operation.source, Path::new(destination)),
            Verb::Write => engine.write(&operation.source, destination),
            Verb::Move => engine.rename(&operation.source, destination),
            Verb::Delete => engine.delete(&operation.source),
            Verb::Clean => engine.clean(&operation.source),
        }
    }
}

fn emit_completed(report: &DeployReport, events: &dyn DeployEventSink) {
    events.on_event(DeployEvent::Completed {
        succeeded: report.succeeded(),
        failed: report.failed(),
        ignored: report.ignored(),
    });
}
