//! Logger facade
//!
//! [`Logger`] turns each call into one [`LogEvent`] and hands it to every
//! planted destination whose threshold accepts it. Dispatch is synchronous
//! on the calling thread.

use super::analytics::{to_params, AnalyticsSink, AnalyticsValue};
use super::event::{LogEvent, Origin, Purpose};
use super::level::Severity;
use super::output::{ConsoleDestination, ConsoleTarget, Destination, FileDestination, FileSlot};
use super::redaction::Redactable;
use super::remote::{CrashReporter, RemoteDestination};
use super::rotation::LogSort;
use super::store::{FlagStore, ReportOnce, REPORTED_FILE_PATH_ERROR};
use crate::config::{BasicValidator, Config, ConfigLoader, ConfigResult};
use std::borrow::Cow;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Title of the report sent when file logging cannot be enabled.
pub const LOG_ACCESS_ERROR: &str = "sinklog could not create external logs";

/// Logging metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingMetrics {
    /// Total logging calls
    pub entries_logged: u64,

    /// Calls by severity name
    pub entries_by_level: HashMap<String, u64>,

    /// Events handed to destinations
    pub destination_writes: u64,

    /// Analytics events forwarded to the sink
    pub analytics_events: u64,

    /// Analytics events skipped by the preset
    pub analytics_skipped: u64,
}

#[derive(Debug, Default)]
struct LoggerStats {
    by_level: [AtomicU64; Severity::EVENTS.len()],
    destination_writes: AtomicU64,
    analytics_events: AtomicU64,
    analytics_skipped: AtomicU64,
}

impl LoggerStats {
    fn record(&self, severity: Severity) {
        if let Some(index) = severity.event_index() {
            self.by_level[index].fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> LoggingMetrics {
        let mut metrics = LoggingMetrics::default();
        for (severity, count) in Severity::EVENTS.iter().zip(&self.by_level) {
            let count = count.load(Ordering::Relaxed);
            metrics.entries_logged += count;
            if count > 0 {
                metrics
                    .entries_by_level
                    .insert(severity.as_str().to_string(), count);
            }
        }
        metrics.destination_writes = self.destination_writes.load(Ordering::Relaxed);
        metrics.analytics_events = self.analytics_events.load(Ordering::Relaxed);
        metrics.analytics_skipped = self.analytics_skipped.load(Ordering::Relaxed);
        metrics
    }
}

/// Logger builder
pub struct LoggerBuilder {
    console: Option<ConsoleTarget>,
    reporter: Option<Arc<dyn CrashReporter>>,
    flag_store: Option<Arc<dyn FlagStore>>,
    analytics: Option<Arc<dyn AnalyticsSink>>,
    destinations: Vec<Arc<dyn Destination>>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            console: Some(ConsoleTarget::Stdout),
            reporter: None,
            flag_store: None,
            analytics: None,
            destinations: Vec::new(),
        }
    }
}

impl LoggerBuilder {
    /// Builder: write console lines to `target`
    pub fn console(mut self, target: ConsoleTarget) -> Self {
        self.console = Some(target);
        self
    }

    /// Builder: no console destination
    pub fn without_console(mut self) -> Self {
        self.console = None;
        self
    }

    /// Builder: plant a remote destination backed by `reporter`
    pub fn crash_reporter(mut self, reporter: Arc<dyn CrashReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Builder: persist the report-once flag in `store`
    pub fn flag_store(mut self, store: Arc<dyn FlagStore>) -> Self {
        self.flag_store = Some(store);
        self
    }

    /// Builder: forward `track` calls to `sink`
    pub fn analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    /// Builder: plant an additional destination
    pub fn destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Build the logger with the default configuration.
    ///
    /// File logging stays off until [`Logger::init_with`] supplies a write path.
    pub fn build(self) -> Logger {
        let file = FileSlot::new();
        let mut destinations: Vec<Arc<dyn Destination>> = Vec::new();

        if let Some(target) = self.console {
            destinations.push(Arc::new(ConsoleDestination::new(target)));
        }
        if let Some(reporter) = &self.reporter {
            let remote = RemoteDestination::new(Arc::clone(reporter)).with_log_files(file.clone());
            destinations.push(Arc::new(remote));
        }
        destinations.extend(self.destinations);

        Logger {
            config: RwLock::new(Arc::new(Config::default())),
            destinations: RwLock::new(destinations),
            file,
            reporter: self.reporter,
            analytics: self.analytics,
            path_error_once: ReportOnce::new(self.flag_store, REPORTED_FILE_PATH_ERROR),
            stats: LoggerStats::default(),
        }
    }
}

/// Multi-destination logger
pub struct Logger {
    /// Active configuration; snapshotted once per call
    config: RwLock<Arc<Config>>,

    /// Console, remote and custom destinations
    destinations: RwLock<Vec<Arc<dyn Destination>>>,

    /// File destination, planted by `init_with`
    file: FileSlot,

    /// Remote backend
    reporter: Option<Arc<dyn CrashReporter>>,

    /// Analytics backend
    analytics: Option<Arc<dyn AnalyticsSink>>,

    /// Gate for the invalid write path report
    path_error_once: ReportOnce,

    /// Metrics
    stats: LoggerStats,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a console-only logger
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a logger
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Apply `config` and (re)plant the file destination.
    ///
    /// The file destination needs an existing `file_write_path`; logs go to
    /// its `logs/` subdirectory. Without one, file logging stays off and the
    /// failure is reported remotely at most once.
    ///
    /// A configuration that fails validation is not applied; the previous
    /// one stays active and a warning is logged.
    pub fn init_with(&self, config: Config) {
        if let Err(e) = self.try_init_with(config) {
            self.log_internal(Severity::Warn, format!("Configuration rejected: {e}"));
        }
    }

    /// Validate and apply `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::config::ConfigError::ValidationError`] without touching the active
    /// configuration or file destination.
    pub fn try_init_with(&self, config: Config) -> ConfigResult<()> {
        ConfigLoader::new()
            .with_validator(BasicValidator::new())
            .validate(&config)?;
        self.apply(config);
        Ok(())
    }

    fn apply(&self, config: Config) {
        let config = Arc::new(config);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&config);

        let file = match &config.file_write_path {
            Some(path) if path.is_dir() => {
                let directory = path.join("logs");
                match FileDestination::new(&directory, &config) {
                    Ok(file) => Some(Arc::new(file)),
                    Err(e) => {
                        warn!(path = %directory.display(), error = %e, "failed to create log directory");
                        None
                    },
                }
            },
            _ => None,
        };

        let planted = file.is_some();
        self.file.replace(file);

        if !planted {
            self.check_for_log_access_error(&config);
        }

        self.log_internal(Severity::Info, format!("sinklog initialized:\n{config}"));
    }

    fn check_for_log_access_error(&self, config: &Config) {
        let path = config
            .file_write_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());
        self.log_internal(Severity::Info, format!("File path {path} is invalid"));

        if self.is_remote_enabled(config) && self.path_error_once.try_claim() {
            self.log_internal(Severity::Error, LOG_ACCESS_ERROR);
        } else {
            self.log_internal(Severity::Warn, LOG_ACCESS_ERROR);
        }
    }

    fn is_remote_enabled(&self, config: &Config) -> bool {
        self.reporter.is_some() && config.preset.remote() != Severity::None
    }

    /// Plant an additional destination
    pub fn plant(&self, destination: Arc<dyn Destination>) {
        self.destinations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(destination);
    }

    /// Number of planted destinations, file included
    pub fn destination_count(&self) -> usize {
        let planted = self
            .destinations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        planted + usize::from(self.file.is_planted())
    }

    /// Active configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Get current metrics
    pub fn stats(&self) -> LoggingMetrics {
        self.stats.snapshot()
    }

    /// Log a verbose message
    #[track_caller]
    pub fn verbose<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Verbose, message.into(), None, None, Purpose::Normal, Origin::caller());
    }

    /// Log a verbose message with a payload
    #[track_caller]
    pub fn verbose_with<'a>(&self, message: impl Into<Cow<'a, str>>, payload: &dyn Redactable) {
        self.log(Severity::Verbose, message.into(), None, Some(payload), Purpose::Normal, Origin::caller());
    }

    /// Log a debug message
    #[track_caller]
    pub fn debug<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Debug, message.into(), None, None, Purpose::Normal, Origin::caller());
    }

    /// Log a debug message with a payload
    #[track_caller]
    pub fn debug_with<'a>(&self, message: impl Into<Cow<'a, str>>, payload: &dyn Redactable) {
        self.log(Severity::Debug, message.into(), None, Some(payload), Purpose::Normal, Origin::caller());
    }

    /// Log an info message
    #[track_caller]
    pub fn info<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Info, message.into(), None, None, Purpose::Normal, Origin::caller());
    }

    /// Log an info message with a payload
    #[track_caller]
    pub fn info_with<'a>(&self, message: impl Into<Cow<'a, str>>, payload: &dyn Redactable) {
        self.log(Severity::Info, message.into(), None, Some(payload), Purpose::Normal, Origin::caller());
    }

    /// Log a warning
    #[track_caller]
    pub fn warn<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Warn, message.into(), None, None, Purpose::Normal, Origin::caller());
    }

    /// Log a warning with a payload
    #[track_caller]
    pub fn warn_with<'a>(&self, message: impl Into<Cow<'a, str>>, payload: &dyn Redactable) {
        self.log(Severity::Warn, message.into(), None, Some(payload), Purpose::Normal, Origin::caller());
    }

    /// Log an error
    #[track_caller]
    pub fn error<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Error, message.into(), None, None, Purpose::Error, Origin::caller());
    }

    /// Log an error with an optional cause and payload
    #[track_caller]
    pub fn error_with<'a>(
        &self,
        message: impl Into<Cow<'a, str>>,
        cause: Option<&'a (dyn Error + 'static)>,
        payload: Option<&dyn Redactable>,
    ) {
        self.log(Severity::Error, message.into(), cause, payload, Purpose::Error, Origin::caller());
    }

    /// Log a fatal error
    #[track_caller]
    pub fn fatal<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Fatal, message.into(), None, None, Purpose::Fatal, Origin::caller());
    }

    /// Log a fatal error with an optional cause and payload
    #[track_caller]
    pub fn fatal_with<'a>(
        &self,
        message: impl Into<Cow<'a, str>>,
        cause: Option<&'a (dyn Error + 'static)>,
        payload: Option<&dyn Redactable>,
    ) {
        self.log(Severity::Fatal, message.into(), cause, payload, Purpose::Fatal, Origin::caller());
    }

    /// Submit a user-initiated problem report.
    ///
    /// Logged at error severity; recent log files are attached when
    /// `detailed_logs_on_user_reports` is set.
    #[track_caller]
    pub fn user_report<'a>(&self, message: impl Into<Cow<'a, str>>) {
        self.log(Severity::Error, message.into(), None, None, Purpose::UserReport, Origin::caller());
    }

    /// Submit a user report with an optional cause and payload
    #[track_caller]
    pub fn user_report_with<'a>(
        &self,
        message: impl Into<Cow<'a, str>>,
        cause: Option<&'a (dyn Error + 'static)>,
        payload: Option<&dyn Redactable>,
    ) {
        self.log(Severity::Error, message.into(), cause, payload, Purpose::UserReport, Origin::caller());
    }

    /// Log from inside the logger; the origin is the logger itself
    fn log_internal(&self, severity: Severity, message: impl Into<String>) {
        let purpose = match severity {
            Severity::Error => Purpose::Error,
            Severity::Fatal => Purpose::Fatal,
            _ => Purpose::Normal,
        };
        self.log(severity, Cow::Owned(message.into()), None, None, purpose, Origin::caller());
    }

    fn log<'a>(
        &self,
        severity: Severity,
        message: Cow<'a, str>,
        cause: Option<&'a (dyn Error + 'static)>,
        payload: Option<&dyn Redactable>,
        purpose: Purpose,
        origin: Origin,
    ) {
        let config = self.config();
        self.stats.record(severity);

        let mut event = LogEvent::new(severity, message)
            .with_origin(origin)
            .with_cause(cause)
            .with_purpose(purpose)
            .with_attach_log_files(
                purpose == Purpose::UserReport && config.detailed_logs_on_user_reports,
            );

        if let Some(payload) = payload {
            event = event.with_payload(config.redactor().describe(payload));
        }

        if purpose != Purpose::Normal {
            if let Some(provider) = &config.extra_info {
                event = event.with_extra_info(Some(provider.extra_info(purpose)));
            }
        }

        // File first so attachments include this event's line.
        if let Some(file) = self.file.get() {
            self.emit(file.as_ref(), &config, &event);
        }

        let destinations = self
            .destinations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for destination in &destinations {
            self.emit(destination.as_ref(), &config, &event);
        }
    }

    fn emit(&self, destination: &dyn Destination, config: &Config, event: &LogEvent<'_>) {
        if destination.is_loggable(config, event.severity) {
            destination.emit(config, event);
            self.stats.destination_writes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Associate remote reports with a user id. Not logged.
    pub fn set_user_id(&self, user_id: &str) {
        if let Some(reporter) = &self.reporter {
            reporter.set_user(Some(user_id));
        }
    }

    /// Clear the remote user id
    pub fn clear_user_id(&self) {
        if let Some(reporter) = &self.reporter {
            reporter.set_user(None);
        }
    }

    /// Contents of every retained log file, oldest first.
    ///
    /// `None` if file logging is off.
    pub fn get_full_log_contents(&self) -> Option<String> {
        self.file.get().map(|file| file.log_contents())
    }

    /// Retained log files in the requested order.
    ///
    /// `None` if file logging is off.
    pub fn get_all_log_files(&self, sort: LogSort) -> Option<Vec<PathBuf>> {
        self.file.get().map(|file| file.log_files(sort))
    }

    /// Redacted description of `value` under the active configuration
    pub fn redact(&self, value: &dyn Redactable) -> String {
        self.config().redactor().describe(value)
    }

    /// Forward an analytics event.
    ///
    /// Skipped (with an info line) when the preset disables analytics.
    pub fn track(&self, id: &str, params: &[(&str, AnalyticsValue<'_>)]) {
        let Some(sink) = &self.analytics else {
            self.log_internal(
                Severity::Warn,
                format!("Analytics not configured, dropping event: {id}"),
            );
            return;
        };

        let config = self.config();
        if !config.preset.analytics_enabled() {
            self.stats.analytics_skipped.fetch_add(1, Ordering::Relaxed);
            self.log_internal(Severity::Info, format!("Skipped logging analytics event: {id} ..."));
            return;
        }

        sink.log_event(id, &to_params(&config.redactor(), params));
        self.stats.analytics_events.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("preset", &self.config().preset)
            .field("destinations", &self.destination_count())
            .field("file", &self.file.directory())
            .field("remote", &self.reporter.is_some())
            .field("analytics", &self.analytics.is_some())
            .finish()
    }
}
