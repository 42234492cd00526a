//! Severity levels and threshold checks

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log event, ordered from most to least verbose.
///
/// `None` is a sentinel used as a destination threshold to switch the
/// destination off. It is never a loggable event severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Execution flow tracing
    Verbose,
    /// Debug information
    Debug,
    /// General information
    #[default]
    Info,
    /// Warnings
    #[serde(alias = "warning")]
    Warn,
    /// Errors, reported remotely
    Error,
    /// Unrecoverable errors
    Fatal,
    /// Never loggable
    None,
}

impl Severity {
    /// All real event severities, in ascending order.
    pub const EVENTS: [Severity; 6] = [
        Self::Verbose,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
    ];

    /// Numeric priority, 2 (verbose) through 7 (fatal).
    pub const fn priority(self) -> u8 {
        match self {
            Self::Verbose => 2,
            Self::Debug => 3,
            Self::Info => 4,
            Self::Warn => 5,
            Self::Error => 6,
            Self::Fatal => 7,
            Self::None => 100,
        }
    }

    /// Map a platform priority back to a severity.
    pub fn from_priority(priority: u8) -> Option<Self> {
        match priority {
            2 => Some(Self::Verbose),
            3 => Some(Self::Debug),
            4 => Some(Self::Info),
            5 => Some(Self::Warn),
            6 => Some(Self::Error),
            7 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Upper-case name used in file lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verbose => "VERBOSE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::None => "NONE",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "verbose" | "trace" => Some(Self::Verbose),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            "fatal" | "assert" => Some(Self::Fatal),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }

    /// Emoji decoration for console output.
    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            Self::Warn => Some("⚠️"),
            Self::Error | Self::Fatal => Some("🚫"),
            _ => None,
        }
    }

    /// Whether this event severity passes the given destination threshold.
    pub fn passes(self, threshold: Severity) -> bool {
        is_loggable(threshold, self)
    }

    /// Slot of this severity in [`Severity::EVENTS`].
    pub(crate) fn event_index(self) -> Option<usize> {
        Self::EVENTS.iter().position(|s| *s == self)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether an event of `severity` is loggable at `threshold`.
///
/// A `None` threshold disables the destination entirely.
pub fn is_loggable(threshold: Severity, severity: Severity) -> bool {
    threshold != Severity::None && severity != Severity::None && severity >= threshold
}
