//! Configuration types.

use crate::logging::event::{ExtraInfo, Purpose};
use crate::logging::preset::SeverityPreset;
use crate::logging::redaction::Redactor;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Seconds in a day.
const SECONDS_PER_DAY: u64 = 86_400;

/// Logger configuration.
///
/// Built once at startup and handed to [`Logger::init_with`]. The callback
/// fields cannot be expressed in TOML and are skipped by serde.
///
/// [`Logger::init_with`]: crate::logging::Logger::init_with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application identifier written into every file line.
    pub app_id: String,

    /// Whether the host is a debug build.
    pub is_debug: bool,

    /// Directory where the `logs/` folder is created. The file
    /// destination stays disabled without it.
    pub file_write_path: Option<PathBuf>,

    /// Destination thresholds.
    pub preset: SeverityPreset,

    /// File rotation and retention.
    pub rotation: RotationSettings,

    /// Redact every field of types without an allow-list.
    pub require_redacted: bool,

    /// Attach recent log files to user reports.
    pub detailed_logs_on_user_reports: bool,

    /// Decides which causes are kept out of remote error reports.
    #[serde(skip)]
    pub throwable_filter: Option<ThrowableFilter>,

    /// Supplies extra information for error, fatal and user reports.
    #[serde(skip)]
    pub extra_info: Option<ExtraInfoProvider>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Config {
    /// Create a configuration with the default preset for the build type.
    pub fn new(is_debug: bool) -> Self {
        Self {
            app_id: "app".to_string(),
            is_debug,
            file_write_path: None,
            preset: SeverityPreset::for_build(is_debug),
            rotation: RotationSettings::default(),
            require_redacted: false,
            detailed_logs_on_user_reports: false,
            throwable_filter: None,
            extra_info: None,
        }
    }

    /// Builder: set application id
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Builder: set write path
    pub fn with_file_write_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_write_path = Some(path.into());
        self
    }

    /// Builder: set preset
    pub fn with_preset(mut self, preset: SeverityPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Builder: set rotation settings
    pub fn with_rotation(mut self, rotation: RotationSettings) -> Self {
        self.rotation = rotation;
        self
    }

    /// Builder: set redact-by-default
    pub fn with_require_redacted(mut self, require: bool) -> Self {
        self.require_redacted = require;
        self
    }

    /// Builder: attach log files to user reports
    pub fn with_detailed_logs_on_user_reports(mut self, enabled: bool) -> Self {
        self.detailed_logs_on_user_reports = enabled;
        self
    }

    /// Builder: set the suppression predicate
    pub fn with_throwable_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.throwable_filter = Some(ThrowableFilter::new(filter));
        self
    }

    /// Builder: set the extra info callback
    pub fn with_extra_info<F>(mut self, provider: F) -> Self
    where
        F: Fn(Purpose) -> ExtraInfo + Send + Sync + 'static,
    {
        self.extra_info = Some(ExtraInfoProvider::new(provider));
        self
    }

    /// Directory holding the log file pool
    pub fn log_directory(&self) -> Option<PathBuf> {
        self.file_write_path.as_ref().map(|path| path.join("logs"))
    }

    /// Redactor honouring `require_redacted`
    pub fn redactor(&self) -> Redactor {
        Redactor::new(self.require_redacted)
    }

    /// Whether `cause` should be kept out of remote error reports
    pub fn should_suppress(&self, cause: &(dyn Error + 'static)) -> bool {
        self.throwable_filter
            .as_ref()
            .is_some_and(|filter| filter.should_suppress(cause))
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .file_write_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string());

        write!(
            f,
            "Config(\n  preset = {},\n  fileWritePath = {},\n  rotationSeconds = {},\n  keepLogsForDays = {},\n  requireRedacted = {},\n  detailedLogsOnUserReports = {})",
            self.preset,
            path,
            self.rotation.rotation_seconds,
            self.rotation.keep_logs_for_days,
            self.require_redacted,
            self.detailed_logs_on_user_reports
        )
    }
}

/// Log file rotation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Seconds a file stays current before rotating.
    pub rotation_seconds: u64,

    /// Days a file is kept after its last write.
    pub keep_logs_for_days: u32,

    /// Number of files in the pool.
    pub pool_size: usize,

    /// File name prefix
    pub file_prefix: String,

    /// File extension
    pub file_extension: String,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            rotation_seconds: 600,
            keep_logs_for_days: 3,
            pool_size: 10,
            file_prefix: "sclog".to_string(),
            file_extension: "txt".to_string(),
        }
    }
}

impl RotationSettings {
    /// Builder: set rotation period in seconds
    pub fn with_rotation_seconds(mut self, seconds: u64) -> Self {
        self.rotation_seconds = seconds;
        self
    }

    /// Builder: set retention in days
    pub fn with_keep_logs_for_days(mut self, days: u32) -> Self {
        self.keep_logs_for_days = days;
        self
    }

    /// Builder: set pool size
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Rotation period
    pub fn rotation_period(&self) -> Duration {
        Duration::from_secs(self.rotation_seconds)
    }

    /// Retention period
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_logs_for_days) * SECONDS_PER_DAY)
    }
}

type FilterFn = dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync;

/// Suppression predicate for remote error reporting.
#[derive(Clone)]
pub struct ThrowableFilter(Arc<FilterFn>);

impl ThrowableFilter {
    /// Wrap a predicate
    pub fn new<F>(filter: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(filter))
    }

    /// Suppress every cause of type `E`.
    pub fn suppress_type<E: Error + 'static>() -> Self {
        Self::new(|cause| cause.is::<E>())
    }

    /// Run the predicate
    pub fn should_suppress(&self, cause: &(dyn Error + 'static)) -> bool {
        (self.0)(cause)
    }
}

impl fmt::Debug for ThrowableFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ThrowableFilter(..)")
    }
}

type ExtraInfoFn = dyn Fn(Purpose) -> ExtraInfo + Send + Sync;

/// Callback producing extra information for a purpose.
#[derive(Clone)]
pub struct ExtraInfoProvider(Arc<ExtraInfoFn>);

impl ExtraInfoProvider {
    /// Wrap a callback
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn(Purpose) -> ExtraInfo + Send + Sync + 'static,
    {
        Self(Arc::new(provider))
    }

    /// Run the callback
    pub fn extra_info(&self, purpose: Purpose) -> ExtraInfo {
        (self.0)(purpose)
    }
}

impl fmt::Debug for ExtraInfoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExtraInfoProvider(..)")
    }
}
