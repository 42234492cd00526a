//! Configuration validation.

use super::types::Config;

/// Largest accepted log file pool.
pub const MAX_POOL_SIZE: usize = 100;

/// A single validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// Error message.
    pub message: String,
    /// Severity level.
    pub severity: ValidationSeverity,
}

impl ValidationError {
    /// Create a new error.
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    /// Create a new warning.
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }
}

/// Severity of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Error - configuration is invalid.
    Error,
    /// Warning - configuration may have issues.
    Warning,
}

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Check if the validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self
            .errors
            .iter()
            .any(|e| e.severity == ValidationSeverity::Error)
    }

    /// Get all validation issues.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get only errors (not warnings).
    #[must_use]
    pub fn errors_only(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Error)
            .collect()
    }

    /// Get only warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Warning)
            .collect()
    }

    /// Merge another validation result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

/// Trait for configuration validators.
pub trait Validator: std::fmt::Debug + Send + Sync {
    /// Validate a configuration and return any errors.
    fn validate(&self, config: &Config) -> ValidationResult;
}

/// Built-in validator for rotation and path settings.
#[derive(Debug, Default)]
pub struct BasicValidator;

impl BasicValidator {
    /// Create a new basic validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for BasicValidator {
    fn validate(&self, config: &Config) -> ValidationResult {
        let mut result = ValidationResult::new();
        let rotation = &config.rotation;

        if rotation.rotation_seconds == 0 {
            result.add_error(ValidationError::error(
                "rotation.rotation_seconds",
                "Rotation period must be greater than 0",
            ));
        }

        if rotation.keep_logs_for_days == 0 {
            result.add_error(ValidationError::error(
                "rotation.keep_logs_for_days",
                "Retention must be at least one day",
            ));
        }

        if rotation.pool_size == 0 || rotation.pool_size > MAX_POOL_SIZE {
            result.add_error(ValidationError::error(
                "rotation.pool_size",
                format!("Pool size must be between 1 and {MAX_POOL_SIZE}"),
            ));
        }

        if !is_plain_name(&rotation.file_prefix) {
            result.add_error(ValidationError::error(
                "rotation.file_prefix",
                "File prefix must be a non-empty name without separators",
            ));
        }

        if !is_plain_name(&rotation.file_extension) {
            result.add_error(ValidationError::error(
                "rotation.file_extension",
                "File extension must be a non-empty name without separators",
            ));
        }

        if rotation.rotation_period() > rotation.retention() {
            result.add_error(ValidationError::warning(
                "rotation.rotation_seconds",
                "Rotation period exceeds retention; files are pruned while still current",
            ));
        }

        if let Some(path) = &config.file_write_path {
            if path.is_relative() {
                result.add_error(ValidationError::warning(
                    "file_write_path",
                    "Relative write path resolves against the working directory",
                ));
            }
        }

        result
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', '.'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotationSettings;

    #[test]
    fn test_valid_default_config() {
        let result = BasicValidator::new().validate(&Config::default());
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_zero_rotation_period() {
        let config = Config::default().with_rotation(RotationSettings::default().with_rotation_seconds(0));
        let result = BasicValidator::new().validate(&config);
        assert!(!result.is_valid());
        assert_eq!(result.errors_only()[0].field, "rotation.rotation_seconds");
    }

    #[test]
    fn test_pool_size_bounds() {
        for size in [0, MAX_POOL_SIZE + 1] {
            let config = Config::default().with_rotation(RotationSettings::default().with_pool_size(size));
            assert!(!BasicValidator::new().validate(&config).is_valid());
        }
    }

    #[test]
    fn test_prefix_with_separator() {
        let mut config = Config::default();
        config.rotation.file_prefix = "../escape".to_string();
        let result = BasicValidator::new().validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_relative_path_is_warning() {
        let config = Config::default().with_file_write_path("cache");
        let result = BasicValidator::new().validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_long_rotation_is_warning() {
        let rotation = RotationSettings::default()
            .with_rotation_seconds(3 * 86_400)
            .with_keep_logs_for_days(1);
        let config = Config::default().with_rotation(rotation);
        let result = BasicValidator::new().validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings()[0].field, "rotation.rotation_seconds");
    }

    #[test]
    fn test_merge_results() {
        let mut first = ValidationResult::new();
        first.add_error(ValidationError::warning("a", "w"));
        let mut second = ValidationResult::new();
        second.add_error(ValidationError::error("b", "e"));

        first.merge(second);
        assert_eq!(first.errors().len(), 2);
        assert!(!first.is_valid());
    }
}
