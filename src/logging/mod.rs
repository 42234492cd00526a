//! # Logging
//!
//! Multi-destination logging with per-destination thresholds, file
//! rotation, field-level redaction and remote crash reporting.
//!
//! ## Features
//!
//! - Console, rotating file, remote and custom destinations
//! - Severity presets deriving every threshold from one setting
//! - Time-based rotation over a fixed pool of files, with retention
//! - Allow-list redaction of logged objects
//! - Breadcrumbs and error reports with suppression and log attachments
//! - Analytics forwarding gated by the preset

pub mod analytics;
pub mod error;
pub mod event;
pub mod format;
pub mod handler;
pub mod level;
pub mod output;
pub mod preset;
pub mod redaction;
pub mod remote;
pub mod rotation;
pub mod store;

pub use analytics::*;
pub use error::*;
pub use event::*;
pub use format::*;
pub use handler::*;
pub use level::*;
pub use output::*;
pub use preset::*;
pub use redaction::*;
pub use remote::*;
pub use rotation::*;
pub use store::*;
