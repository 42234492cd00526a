//! Remote crash reporting
//!
//! Every loggable event becomes a breadcrumb. Error and fatal events also
//! produce an error report unless their cause is on the suppression list.

use super::event::{ExtraInfo, LogEvent, Origin, Purpose};
use super::format::{cause_chain, BreadcrumbFormatter, LogFormatter};
use super::level::Severity;
use super::output::{Destination, FileSlot};
use super::preset::DestinationKind;
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Category attached to every breadcrumb.
pub const BREADCRUMB_CATEGORY: &str = "sinklog";

/// Number of log files attached to a report.
pub const ATTACHED_LOG_FILES: usize = 2;

/// Breadcrumb level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbLevel {
    /// Debug and verbose events
    Debug,
    /// Info and warn events
    Info,
    /// Error and fatal events
    Error,
}

impl From<Severity> for BreadcrumbLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Fatal | Severity::Error => Self::Error,
            Severity::Warn | Severity::Info => Self::Info,
            Severity::Debug | Severity::Verbose | Severity::None => Self::Debug,
        }
    }
}

/// A trail entry leading up to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Level
    pub level: BreadcrumbLevel,
    /// Category
    pub category: String,
    /// Text
    pub message: String,
}

impl Breadcrumb {
    /// Create a breadcrumb in the default category
    pub fn new(level: BreadcrumbLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            category: BREADCRUMB_CATEGORY.to_string(),
            message: message.into(),
        }
    }
}

/// Error carried by reports for events logged without a cause.
///
/// Its origin is the logging call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntheticError {
    /// Event message
    pub message: String,
    /// Logging call site
    pub origin: Origin,
}

impl SyntheticError {
    /// Create a synthetic error
    pub fn new(message: impl Into<String>, origin: Origin) -> Self {
        Self {
            message: message.into(),
            origin,
        }
    }
}

/// An error report handed to a [`CrashReporter`].
#[derive(Debug)]
pub struct ErrorReport<'a> {
    /// Event severity
    pub level: Severity,
    /// Event message
    pub message: &'a str,
    /// Reported error; a [`SyntheticError`] if the event had no cause
    pub error: &'a (dyn Error + 'static),
    /// Whether `error` was synthesized
    pub synthetic: bool,
    /// Logging call site
    pub origin: Origin,
    /// Why the event was logged
    pub purpose: Purpose,
    /// Host-supplied extra information
    pub extra_info: Option<&'a ExtraInfo>,
    /// Log files to attach, newest first
    pub attachments: Vec<PathBuf>,
}

/// Crash reporting backend
pub trait CrashReporter: Send + Sync {
    /// Record a breadcrumb
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb);

    /// Submit an error report
    fn capture_report(&self, report: ErrorReport<'_>);

    /// Associate subsequent reports with a user, or clear it
    fn set_user(&self, user_id: Option<&str>);
}

/// Remote destination
pub struct RemoteDestination {
    /// Backend
    reporter: Arc<dyn CrashReporter>,

    /// Source of log file attachments
    log_files: FileSlot,
}

impl RemoteDestination {
    /// Create a remote destination without log file attachments
    pub fn new(reporter: Arc<dyn CrashReporter>) -> Self {
        Self {
            reporter,
            log_files: FileSlot::new(),
        }
    }

    /// Builder: attach files from this slot
    pub fn with_log_files(mut self, log_files: FileSlot) -> Self {
        self.log_files = log_files;
        self
    }

    /// Backend
    pub fn reporter(&self) -> &Arc<dyn CrashReporter> {
        &self.reporter
    }

    fn capture(&self, event: &LogEvent<'_>, error: &(dyn Error + 'static), synthetic: bool) {
        let attachments = if event.attach_log_files {
            self.log_files.recent_files(ATTACHED_LOG_FILES)
        } else {
            Vec::new()
        };

        self.reporter.capture_report(ErrorReport {
            level: event.severity,
            message: &event.message,
            error,
            synthetic,
            origin: event.origin,
            purpose: event.purpose,
            extra_info: event.extra_info.as_ref(),
            attachments,
        });
    }
}

impl Destination for RemoteDestination {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Remote
    }

    fn emit(&self, config: &Config, event: &LogEvent<'_>) {
        let level = BreadcrumbLevel::from(event.severity);
        self.reporter
            .add_breadcrumb(Breadcrumb::new(level, BreadcrumbFormatter.format(event)));

        if !event.is_error() {
            return;
        }

        match event.cause {
            Some(cause) if config.should_suppress(cause) => {
                self.reporter.add_breadcrumb(Breadcrumb::new(
                    level,
                    format!("{cause} is on the suppression list and was not captured as an error report"),
                ));
            },
            Some(cause) => {
                self.reporter
                    .add_breadcrumb(Breadcrumb::new(level, cause_chain(cause)));
                self.capture(event, cause, false);
            },
            None => {
                let synthetic = SyntheticError::new(event.message.clone(), event.origin);
                self.capture(event, &synthetic, true);
            },
        }
    }
}

impl fmt::Debug for RemoteDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDestination")
            .field("log_files", &self.log_files.directory())
            .finish()
    }
}

/// Owned copy of a captured [`ErrorReport`]
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedReport {
    /// Event severity
    pub level: Severity,
    /// Event message
    pub message: String,
    /// Rendered error
    pub error: String,
    /// Rendered error with its source chain
    pub error_chain: String,
    /// Whether the error was synthesized
    pub synthetic: bool,
    /// Logging call site
    pub origin: Origin,
    /// Why the event was logged
    pub purpose: Purpose,
    /// Extra information
    pub extra_info: Option<ExtraInfo>,
    /// Attached files
    pub attachments: Vec<PathBuf>,
}

impl From<ErrorReport<'_>> for CapturedReport {
    fn from(report: ErrorReport<'_>) -> Self {
        Self {
            level: report.level,
            message: report.message.to_string(),
            error: report.error.to_string(),
            error_chain: cause_chain(report.error),
            synthetic: report.synthetic,
            origin: report.origin,
            purpose: report.purpose,
            extra_info: report.extra_info.cloned(),
            attachments: report.attachments,
        }
    }
}

#[derive(Debug, Default)]
struct ReporterState {
    breadcrumbs: Vec<Breadcrumb>,
    reports: Vec<CapturedReport>,
    user_id: Option<String>,
}

/// Memory crash reporter (for testing)
#[derive(Debug, Default)]
pub struct MemoryReporter {
    state: Mutex<ReporterState>,
}

impl MemoryReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded breadcrumbs
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.state().breadcrumbs.clone()
    }

    /// Recorded reports
    pub fn reports(&self) -> Vec<CapturedReport> {
        self.state().reports.clone()
    }

    /// Number of recorded reports
    pub fn report_count(&self) -> usize {
        self.state().reports.len()
    }

    /// Current user id
    pub fn user_id(&self) -> Option<String> {
        self.state().user_id.clone()
    }

    /// Clear everything recorded so far
    pub fn clear(&self) {
        *self.state() = ReporterState::default();
    }

    fn state(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CrashReporter for MemoryReporter {
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.state().breadcrumbs.push(breadcrumb);
    }

    fn capture_report(&self, report: ErrorReport<'_>) {
        let captured = CapturedReport::from(report);
        self.state().reports.push(captured);
    }

    fn set_user(&self, user_id: Option<&str>) {
        self.state().user_id = user_id.map(str::to_string);
    }
}
