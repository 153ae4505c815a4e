use std::sync::Arc;

use anyhow::Result;
use ferry::config::DeploySettings;
use ferry::domain::ports::DeployEventSink;
use ferry::infrastructure::backends::for_protocol;
use ferry::infrastructure::events::{ConsoleEventSink, ConsoleStyle, JsonEventSink};
use ferry::ui::terminal::detect_capabilities;
use ferry::{DeployUseCase, FerryError};

use super::plan::cmd_plan;

/// How deploy progress is reported
#[derive(Debug, Clone, Copy)]
pub struct Reporting {
    pub json: bool,
    pub ci: bool,
    pub verbose: u8,
}

/// Run the actions against the configured endpoint.
///
/// Returns whether every action succeeded. Connection and per-action failures
/// are reported through the event sink, not as errors.
pub fn cmd_deploy(settings: DeploySettings, dry_run: bool, reporting: Reporting) -> Result<bool> {
    let plan = settings.plan();
    if dry_run {
        return cmd_plan(&plan, reporting.json);
    }

    let batch = plan.compile_actions().map_err(FerryError::from)?;
    let options = plan.options();
    let events = create_event_sink(reporting);

    let backend = for_protocol(settings.endpoint.protocol);
    let mut use_case = DeployUseCase::new(backend);
    let report = use_case.execute_with_events(&settings.endpoint, &batch, &options, events);

    tracing::debug!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        ignored = report.ignored(),
        phase = ?report.phase,
        "deploy finished"
    );
    Ok(report.is_success())
}

fn create_event_sink(reporting: Reporting) -> Arc<dyn DeployEventSink> {
    if reporting.json {
        return Arc::new(JsonEventSink::stdout());
    }
    let style = ConsoleStyle::detect(&detect_capabilities(), reporting.ci);
    Arc::new(ConsoleEventSink::stdout(style).with_verbose(reporting.verbose > 0))
}
