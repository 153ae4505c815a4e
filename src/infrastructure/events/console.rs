//! Console Event Sink
//!
//! Human-readable deploy progress, or GitHub Actions workflow commands when
//! running inside a workflow job.

use crossterm::style::{Color, Stylize};
use std::io::{self, Write};
use std::sync::Mutex;

use crate::domain::entities::Outcome;
use crate::domain::ports::{DeployEvent, DeployEventSink};
use crate::ui::ci::{github_actions_annotation, group_end, group_start, AnnotationLevel};
use crate::ui::terminal::TerminalCapabilities;
use crate::ui::theme::{colors, Icons};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStyle {
    /// Plain or colored text with status icons
    Text { color: bool, unicode: bool },
    /// `::error::` / `::warning::` / `::debug::` lines
    GithubActions,
}

impl ConsoleStyle {
    pub fn detect(caps: &TerminalCapabilities, force_ci: bool) -> Self {
        if force_ci || caps.is_github_actions {
            ConsoleStyle::GithubActions
        } else {
            ConsoleStyle::Text {
                color: caps.supports_color,
                unicode: caps.supports_unicode,
            }
        }
    }
}

pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    style: ConsoleStyle,
    verbose: bool,
}

impl ConsoleEventSink {
    pub fn stdout(style: ConsoleStyle) -> Self {
        Self::with_writer(io::stdout(), style)
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W, style: ConsoleStyle) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            style,
            verbose: false,
        }
    }

    /// Also print one line per transferred entry inside directory actions
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn emit(&self, line: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        match self.style {
            ConsoleStyle::Text { color: true, .. } => text.with(color).to_string(),
            _ => text.to_string(),
        }
    }

    fn icons(&self) -> Icons {
        match self.style {
            ConsoleStyle::Text { unicode, .. } => Icons::new(unicode),
            ConsoleStyle::GithubActions => Icons::new(false),
        }
    }

    fn render_outcome(&self, outcome: &Outcome) -> String {
        match self.style {
            ConsoleStyle::GithubActions => render_github_outcome(outcome),
            ConsoleStyle::Text { .. } => {
                let icons = self.icons();
                let (icon, color) = if outcome.is_success() {
                    (icons.success, colors::SUCCESS)
                } else if outcome.is_ignored() {
                    (icons.skipped, colors::DIM)
                } else {
                    (icons.error, colors::ERROR)
                };
                let mut line = format!(
                    "{} {} {}",
                    self.paint(icon, color),
                    outcome.verb.title(),
                    outcome.file
                );
                if let Some(message) = &outcome.message {
                    line.push_str(&self.paint(&format!(" ({})", message), colors::DIM));
                }
                line
            }
        }
    }
}

/// `Uploaded: file`, `Upload Failed: file (msg: ...)`, `::debug::Upload Ignored: ...`
pub fn render_github_outcome(outcome: &Outcome) -> String {
    let suffix = outcome
        .message
        .as_deref()
        .map(|m| format!(" (msg: {})", m))
        .unwrap_or_default();

    if outcome.is_success() {
        format!("{}: {}{}", outcome.verb.past_tense(), outcome.file, suffix)
    } else if outcome.is_ignored() {
        github_actions_annotation(
            AnnotationLevel::Debug,
            &format!("{} Ignored: {}{}", outcome.verb.title(), outcome.file, suffix),
            None,
            None,
        )
    } else {
        github_actions_annotation(
            AnnotationLevel::Error,
            &format!("{} Failed: {}{}", outcome.verb.title(), outcome.file, suffix),
            None,
            None,
        )
    }
}

impl DeployEventSink for ConsoleEventSink {
    fn on_event(&self, event: DeployEvent) {
        let github = self.style == ConsoleStyle::GithubActions;
        match event {
            DeployEvent::Connecting { endpoint, .. } => {
                if github {
                    self.emit(&group_start(&format!("Deploy to {}", endpoint)));
                } else {
                    let icon = self.icons().remote;
                    self.emit(&format!("{} Connecting to {}", icon, endpoint));
                }
            }

            DeployEvent::Connected { status: true, .. } => {
                if !github {
                    self.emit(&format!(
                        "{} Connected",
                        self.paint(self.icons().success, colors::SUCCESS)
                    ));
                }
            }

            DeployEvent::Connected {
                status: false,
                message,
            } => {
                let message = message.unwrap_or_else(|| "unknown error".to_string());
                if github {
                    self.emit(&github_actions_annotation(
                        AnnotationLevel::Error,
                        &format!("Connect Failed (msg: {})", message),
                        None,
                        None,
                    ));
                } else {
                    self.emit(&format!(
                        "{} Connect failed: {}",
                        self.paint(self.icons().error, colors::ERROR),
                        message
                    ));
                }
            }

            DeployEvent::Entry { outcome } => {
                // Failures inside a mirror are always worth a line.
                if self.verbose || outcome.is_failure() {
                    let line = self.render_outcome(&outcome);
                    // workflow commands must start the line
                    if github {
                        self.emit(&line);
                    } else {
                        self.emit(&format!("  {}", line));
                    }
                }
            }

            DeployEvent::Action { outcome, .. } => {
                self.emit(&self.render_outcome(&outcome));
            }

            DeployEvent::Aborted { index, reason } => {
                let text = format!("Deploy aborted at action {}: {}", index + 1, reason);
                if github {
                    self.emit(&github_actions_annotation(
                        AnnotationLevel::Error,
                        &text,
                        None,
                        None,
                    ));
                } else {
                    self.emit(&self.paint(&text, colors::ERROR));
                }
            }

            DeployEvent::Closed { status, message } => {
                if status {
                    return;
                }
                let text = format!(
                    "Close failed: {}",
                    message.unwrap_or_else(|| "unknown error".to_string())
                );
                if github {
                    self.emit(&github_actions_annotation(
                        AnnotationLevel::Warning,
                        &text,
                        None,
                        None,
                    ));
                } else {
                    self.emit(&self.paint(&text, colors::WARNING));
                }
            }

            DeployEvent::Completed {
                succeeded,
                failed,
                ignored,
            } => {
                let summary = format!(
                    "{} succeeded, {} failed, {} ignored",
                    succeeded, failed, ignored
                );
                if github {
                    self.emit(group_end());
                    if failed > 0 {
                        self.emit(&github_actions_annotation(
                            AnnotationLevel::Error,
                            &format!("Deploy finished with failures: {}", summary),
                            None,
                            Some("Deploy"),
                        ));
                    } else {
                        self.emit(&format!("Deploy finished: {}", summary));
                    }
                } else {
                    let color = if failed == 0 {
                        colors::SUCCESS
                    } else {
                        colors::ERROR
                    };
                    self.emit(&self.paint(&format!("Deploy finished: {}", summary), color));
                }
            }
        }
    }

    fn wants_detailed_events(&self) -> bool {
        true
    }
}
