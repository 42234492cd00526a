//! Log destinations

use super::error::LogResult;
use super::event::LogEvent;
use super::format::{BreadcrumbFormatter, ConsoleFormatter, FileFormatter, LogFormatter};
use super::level::{is_loggable, Severity};
use super::preset::DestinationKind;
use super::rotation::{LogRotator, LogSort};
use crate::config::Config;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::SystemTime;
use tracing::warn;

/// A sink for log events.
///
/// `emit` never fails outward: destinations report their own I/O problems
/// through `tracing` and never back into the logger.
pub trait Destination: Send + Sync {
    /// Destination kind, used to pick a threshold from the preset
    fn kind(&self) -> DestinationKind;

    /// Check if this destination accepts `severity` under `config`
    fn is_loggable(&self, config: &Config, severity: Severity) -> bool {
        is_loggable(config.preset.threshold(self.kind()), severity)
    }

    /// Write an event
    fn emit(&self, config: &Config, event: &LogEvent<'_>);
}

/// Console stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    /// Standard output
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

/// Console destination
#[derive(Debug, Default)]
pub struct ConsoleDestination {
    target: ConsoleTarget,
    formatter: ConsoleFormatter,
}

impl ConsoleDestination {
    /// Create a console destination writing to `target`
    pub fn new(target: ConsoleTarget) -> Self {
        Self {
            target,
            formatter: ConsoleFormatter,
        }
    }

    /// Stream this destination writes to
    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        match self.target {
            ConsoleTarget::Stdout => writeln!(io::stdout().lock(), "{line}"),
            ConsoleTarget::Stderr => writeln!(io::stderr().lock(), "{line}"),
        }
    }
}

impl Destination for ConsoleDestination {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Console
    }

    fn emit(&self, _config: &Config, event: &LogEvent<'_>) {
        let line = self.formatter.format(event);
        if let Err(e) = self.write_line(&line) {
            warn!(error = %e, "failed to write console log line");
        }
    }
}

/// Rotating file destination
pub struct FileDestination {
    /// Rotation state; rotation and append happen under one lock
    rotator: Mutex<LogRotator>,

    /// Line formatter
    formatter: FileFormatter,
}

impl FileDestination {
    /// Create a file destination over `directory`, creating it if needed
    pub fn new(directory: impl Into<PathBuf>, config: &Config) -> LogResult<Self> {
        let rotator = LogRotator::new(directory, &config.rotation)?;

        Ok(Self {
            rotator: Mutex::new(rotator),
            formatter: FileFormatter::new(config.app_id.clone()),
        })
    }

    /// Directory holding the log files
    pub fn directory(&self) -> PathBuf {
        self.rotator().directory().to_path_buf()
    }

    /// Append one formatted line at `now`
    pub fn write_line(&self, now: SystemTime, line: &str) -> LogResult<()> {
        self.rotator().append_line(now, line)
    }

    /// Contents of every retained log file, oldest first
    pub fn log_contents(&self) -> String {
        self.rotator().read_all_contents(SystemTime::now())
    }

    /// Retained log files in the requested order
    pub fn log_files(&self, sort: LogSort) -> Vec<PathBuf> {
        self.rotator().list_files(sort)
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> Option<PathBuf> {
        self.rotator().current_path()
    }

    fn rotator(&self) -> MutexGuard<'_, LogRotator> {
        self.rotator.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Destination for FileDestination {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Disk
    }

    fn emit(&self, _config: &Config, event: &LogEvent<'_>) {
        let line = self.formatter.format(event);
        if let Err(e) = self.write_line(event.timestamp.into(), &line) {
            warn!(error = %e, "failed to append log line");
        }
    }
}

impl std::fmt::Debug for FileDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDestination")
            .field("rotator", &*self.rotator())
            .finish()
    }
}

/// Shared handle to the planted file destination.
///
/// `Logger::init_with` swaps the destination in place, so holders such as
/// the remote destination always see the current one.
#[derive(Debug, Default, Clone)]
pub struct FileSlot(Arc<RwLock<Option<Arc<FileDestination>>>>);

impl FileSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Current file destination, if any
    pub fn get(&self) -> Option<Arc<FileDestination>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the file destination
    pub fn replace(&self, destination: Option<Arc<FileDestination>>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = destination;
    }

    /// Most recent log files, newest first
    pub fn recent_files(&self, limit: usize) -> Vec<PathBuf> {
        self.get()
            .map(|file| {
                file.log_files(LogSort::LastModifiedDesc)
                    .into_iter()
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Directory of the current file destination
    pub fn directory(&self) -> Option<PathBuf> {
        self.get().map(|file| file.directory())
    }

    /// Check if a file destination is planted
    pub fn is_planted(&self) -> bool {
        self.get().is_some()
    }
}

/// Memory destination (for testing)
pub struct MemoryDestination {
    /// Kind reported to the logger
    kind: DestinationKind,

    /// Threshold used instead of the preset
    threshold: Option<Severity>,

    /// Formatter
    formatter: Box<dyn LogFormatter>,

    /// Stored lines
    entries: Mutex<Vec<String>>,
}

impl MemoryDestination {
    /// Create a custom destination following the preset's global threshold
    pub fn new() -> Self {
        Self {
            kind: DestinationKind::Custom,
            threshold: None,
            formatter: Box::new(BreadcrumbFormatter),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Builder: report a different kind
    pub fn with_kind(mut self, kind: DestinationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder: override the preset threshold
    pub fn with_threshold(mut self, threshold: Severity) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Builder: set the formatter
    pub fn with_formatter<F: LogFormatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Get all logged lines, `[SEVERITY] text`
    pub fn entries(&self) -> Vec<String> {
        self.lines().clone()
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.lines().clear();
    }

    /// Get entry count
    pub fn count(&self) -> usize {
        self.lines().len()
    }

    /// Check if any line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    fn lines(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl Destination for MemoryDestination {
    fn kind(&self) -> DestinationKind {
        self.kind
    }

    fn is_loggable(&self, config: &Config, severity: Severity) -> bool {
        let threshold = self
            .threshold
            .unwrap_or_else(|| config.preset.threshold(self.kind));
        is_loggable(threshold, severity)
    }

    fn emit(&self, _config: &Config, event: &LogEvent<'_>) {
        let line = format!("[{}] {}", event.severity.as_str(), self.formatter.format(event));
        self.lines().push(line);
    }
}

impl std::fmt::Debug for MemoryDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDestination")
            .field("kind", &self.kind)
            .field("threshold", &self.threshold)
            .field("count", &self.count())
            .finish()
    }
}
