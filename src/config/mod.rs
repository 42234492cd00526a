//! # Configuration
//!
//! Logger configuration, loadable from TOML. Callback fields
//! (suppression filter, extra info provider) are set in code.
//!
//! ## Example Configuration
//!
//! ```toml
//! app_id = "com.example.notes"
//! preset = "release_advanced"
//! file_write_path = "/data/notes/cache"
//! require_redacted = true
//!
//! [rotation]
//! rotation_seconds = 600
//! keep_logs_for_days = 3
//! pool_size = 10
//! ```

mod error;
mod loader;
mod types;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use types::{Config, ExtraInfoProvider, RotationSettings, ThrowableFilter};
pub use validation::{
    BasicValidator, ValidationError, ValidationResult, ValidationSeverity, Validator,
    MAX_POOL_SIZE,
};
