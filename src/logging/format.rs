//! Per-destination line formatting

use super::error::{LogError, LogResult};
use super::event::LogEvent;
use chrono::format::{Item, StrftimeItems};
use std::error::Error;
use std::fmt::Write;

/// Timestamp format for file lines (`2024-03-01.14:05:09.123`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d.%H:%M:%S%.3f";

/// Log formatter trait
pub trait LogFormatter: Send + Sync {
    /// Format an event to a (possibly multi-line) string
    fn format(&self, event: &LogEvent<'_>) -> String;
}

/// `[emoji ]message[: payload]`
pub fn simple_message(event: &LogEvent<'_>, include_emoji: bool) -> String {
    let mut out = String::with_capacity(event.message.len() + 16);

    if include_emoji {
        if let Some(emoji) = event.severity.emoji() {
            out.push_str(emoji);
            out.push(' ');
        }
    }

    out.push_str(&event.message);

    if let Some(payload) = &event.redacted_payload {
        out.push_str(": ");
        out.push_str(payload);
    }

    out
}

/// Render an error and its `source()` chain, one error per line.
pub fn cause_chain(cause: &dyn Error) -> String {
    let mut out = format!("Error: {cause}");
    let mut source = cause.source();
    while let Some(err) = source {
        let _ = write!(out, "\n    Caused by: {err}");
        source = err.source();
    }
    out
}

/// Console formatter: `[origin] [emoji ]message[: payload]`
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleFormatter;

impl LogFormatter for ConsoleFormatter {
    fn format(&self, event: &LogEvent<'_>) -> String {
        let mut out = format!("{} {}", event.origin.tag(), simple_message(event, true));
        if let Some(cause) = event.cause {
            out.push('\n');
            out.push_str(&cause_chain(cause));
        }
        out
    }
}

/// File formatter:
/// `<timestamp> <appId>[<pid>:<thread>] [<SEVERITY>] [<origin>] > <message>[: <payload>]`
#[derive(Debug, Clone)]
pub struct FileFormatter {
    app_id: String,
    pid: u32,
    timestamp_format: String,
}

impl FileFormatter {
    /// Create a file formatter for the given application id
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            pid: std::process::id(),
            timestamp_format: TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// Builder: set timestamp format (strftime)
    ///
    /// # Errors
    ///
    /// Returns [`LogError::TimestampFormat`] if `format` has an unknown or
    /// incomplete specifier; formatting with it later would panic.
    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> LogResult<Self> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(LogError::TimestampFormat(format));
        }
        self.timestamp_format = format;
        Ok(self)
    }
}

impl LogFormatter for FileFormatter {
    fn format(&self, event: &LogEvent<'_>) -> String {
        let mut out = format!(
            "{} {}[{}:{}] [{}] [{}] > {}",
            event.timestamp.format(&self.timestamp_format),
            self.app_id,
            self.pid,
            event.thread_name,
            event.severity.as_str(),
            event.origin.tag(),
            simple_message(event, false)
        );
        if let Some(cause) = event.cause {
            out.push('\n');
            out.push_str(&cause_chain(cause));
        }
        out
    }
}

/// Breadcrumb formatter: message and payload, no decorations
#[derive(Debug, Default, Clone, Copy)]
pub struct BreadcrumbFormatter;

impl LogFormatter for BreadcrumbFormatter {
    fn format(&self, event: &LogEvent<'_>) -> String {
        simple_message(event, false)
    }
}
