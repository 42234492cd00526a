//! Log events

use super::level::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::panic::Location;

/// Extra key/value information attached to error reports.
pub type ExtraInfo = BTreeMap<String, serde_json::Value>;

/// Why an event was logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Regular logging
    #[default]
    Normal,
    /// `error` call
    Error,
    /// `fatal` call
    Fatal,
    /// User-initiated problem report
    UserReport,
}

impl Purpose {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::UserReport => "user_report",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source location of the logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin {
    /// Source file as reported by the compiler
    pub file: &'static str,
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
}

impl Origin {
    /// Capture the location of the caller.
    ///
    /// Propagates through any chain of `#[track_caller]` functions, so the
    /// public logging methods report the application's call site.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(Location::caller())
    }

    /// File name without its directories.
    pub fn file_name(&self) -> &'static str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(self.file)
    }

    /// Tag used in console and file lines: `(file.rs:12:5)`.
    pub fn tag(&self) -> String {
        format!("({}:{}:{})", self.file_name(), self.line, self.column)
    }
}

impl From<&'static Location<'static>> for Origin {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// One logging call, shared by every destination.
#[derive(Debug, Clone)]
pub struct LogEvent<'a> {
    /// When the call was made
    pub timestamp: DateTime<Utc>,

    /// Event severity
    pub severity: Severity,

    /// Caller's message
    pub message: Cow<'a, str>,

    /// Attached error, if any
    pub cause: Option<&'a (dyn Error + 'static)>,

    /// Why the event was logged
    pub purpose: Purpose,

    /// Call site
    pub origin: Origin,

    /// Name of the calling thread
    pub thread_name: String,

    /// Redacted description of the payload object
    pub redacted_payload: Option<String>,

    /// Extra information for error reports
    pub extra_info: Option<ExtraInfo>,

    /// Attach recent log files to the error report
    pub attach_log_files: bool,
}

impl<'a> LogEvent<'a> {
    /// Create a new event at the caller's location.
    #[track_caller]
    pub fn new(severity: Severity, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            cause: None,
            purpose: Purpose::Normal,
            origin: Origin::caller(),
            thread_name: current_thread_name(),
            redacted_payload: None,
            extra_info: None,
            attach_log_files: false,
        }
    }

    /// Builder: set the cause
    pub fn with_cause(mut self, cause: Option<&'a (dyn Error + 'static)>) -> Self {
        self.cause = cause;
        self
    }

    /// Builder: set the purpose
    pub fn with_purpose(mut self, purpose: Purpose) -> Self {
        self.purpose = purpose;
        self
    }

    /// Builder: set the origin
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Builder: set the redacted payload description
    pub fn with_payload(mut self, description: impl Into<String>) -> Self {
        self.redacted_payload = Some(description.into());
        self
    }

    /// Builder: set extra info
    pub fn with_extra_info(mut self, extra_info: Option<ExtraInfo>) -> Self {
        self.extra_info = extra_info;
        self
    }

    /// Builder: request log file attachments
    pub fn with_attach_log_files(mut self, attach: bool) -> Self {
        self.attach_log_files = attach;
        self
    }

    /// Builder: set the timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether this event should produce an error report.
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Fatal)
    }
}

fn current_thread_name() -> String {
    std::thread::current()
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| "unnamed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_event_creation() {
        let event = LogEvent::new(Severity::Info, "hello");
        assert_eq!(event.severity, Severity::Info);
        assert_eq!(event.message, "hello");
        assert_eq!(event.purpose, Purpose::Normal);
        assert!(event.cause.is_none());
        assert!(!event.attach_log_files);
        assert!(event.origin.file.ends_with("event.rs"));
    }

    #[test]
    fn test_event_builders() {
        let err = io::Error::new(io::ErrorKind::Other, "boom");
        let event = LogEvent::new(Severity::Error, "failed".to_string())
            .with_cause(Some(&err))
            .with_purpose(Purpose::UserReport)
            .with_payload("User(name=a)")
            .with_attach_log_files(true);

        assert!(event.is_error());
        assert_eq!(event.cause.map(|c| c.to_string()), Some("boom".to_string()));
        assert_eq!(event.redacted_payload.as_deref(), Some("User(name=a)"));
        assert!(event.attach_log_files);
    }

    #[test]
    fn test_origin_tag() {
        let origin = Origin {
            file: "src/app/screens/login.rs",
            line: 42,
            column: 9,
        };
        assert_eq!(origin.file_name(), "login.rs");
        assert_eq!(origin.tag(), "(login.rs:42:9)");
        assert_eq!(origin.to_string(), "src/app/screens/login.rs:42:9");
    }

    #[test]
    fn test_origin_tracks_caller() {
        #[track_caller]
        fn wrapper() -> Origin {
            Origin::caller()
        }

        let expected_line = line!() + 1;
        let origin = wrapper();
        assert_eq!(origin.line, expected_line);
    }

    #[test]
    fn test_thread_name() {
        let name = std::thread::Builder::new()
            .name("worker-1".to_string())
            .spawn(|| LogEvent::new(Severity::Debug, "x").thread_name)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(name, "worker-1");
    }

    #[test]
    fn test_purpose_as_str() {
        assert_eq!(Purpose::UserReport.as_str(), "user_report");
        assert_eq!(Purpose::Fatal.to_string(), "fatal");
    }
}
