//! Named severity presets

use super::level::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of destination a threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    /// Console output
    Console,
    /// Rotating log files
    Disk,
    /// Crash/error reporting service
    Remote,
    /// Host-planted destination, uses the global threshold
    Custom,
}

/// A named bundle of per-destination thresholds.
///
/// Picking one preset configures every destination at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeverityPreset {
    /// Disk: verbose, console: verbose, remote: none
    Firehose,
    /// Disk: none, console: debug, remote: none
    Develop,
    /// Disk: verbose, console: none, remote: verbose
    ReleaseAdvanced,
    /// Disk: none, console: none, remote: info
    #[default]
    Release,
}

impl SeverityPreset {
    /// Default preset for a debug or release build.
    pub fn for_build(is_debug: bool) -> Self {
        if is_debug {
            Self::Firehose
        } else {
            Self::Release
        }
    }

    /// Display name
    pub fn title(&self) -> &'static str {
        match self {
            Self::Firehose => "Firehose",
            Self::Develop => "Develop",
            Self::ReleaseAdvanced => "ReleaseAdvanced",
            Self::Release => "Release",
        }
    }

    /// Console threshold
    pub fn console(&self) -> Severity {
        match self {
            Self::Firehose => Severity::Verbose,
            Self::Develop => Severity::Debug,
            Self::ReleaseAdvanced | Self::Release => Severity::None,
        }
    }

    /// Disk threshold
    pub fn disk(&self) -> Severity {
        match self {
            Self::Firehose | Self::ReleaseAdvanced => Severity::Verbose,
            Self::Develop | Self::Release => Severity::None,
        }
    }

    /// Remote threshold
    pub fn remote(&self) -> Severity {
        match self {
            Self::Firehose | Self::Develop => Severity::None,
            Self::ReleaseAdvanced => Severity::Verbose,
            Self::Release => Severity::Info,
        }
    }

    /// Threshold for custom destinations.
    pub fn global(&self) -> Severity {
        Severity::Info
    }

    /// Whether analytics events are forwarded.
    pub fn analytics_enabled(&self) -> bool {
        matches!(self, Self::ReleaseAdvanced | Self::Release)
    }

    /// Threshold for a destination kind.
    pub fn threshold(&self, kind: DestinationKind) -> Severity {
        match kind {
            DestinationKind::Console => self.console(),
            DestinationKind::Disk => self.disk(),
            DestinationKind::Remote => self.remote(),
            DestinationKind::Custom => self.global(),
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "firehose" => Some(Self::Firehose),
            "develop" => Some(Self::Develop),
            "releaseadvanced" => Some(Self::ReleaseAdvanced),
            "release" => Some(Self::Release),
            _ => None,
        }
    }
}

impl fmt::Display for SeverityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(global={}, console={}, disk={}, remote={})",
            self.title(),
            self.global(),
            self.console(),
            self.disk(),
            self.remote()
        )
    }
}
