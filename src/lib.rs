//! # sinklog
//!
//! A multi-destination logging library for applications that want one
//! call site to feed the console, a rotating set of log files, and a
//! remote crash reporter, each with its own severity threshold.
//!
//! ## Features
//!
//! - Severity presets (`firehose`, `develop`, `release_advanced`, `release`)
//! - Time-based file rotation over a fixed pool with age-based retention
//! - Opt-in field redaction through the [`logging::Redactable`] trait
//! - Breadcrumbs, error reports and log attachments via [`logging::CrashReporter`]
//! - At-most-once reporting of an unusable log directory
//!
//! ## Diagnostics
//!
//! Logging never fails the caller. Problems inside the library itself
//! (a log file that cannot be written, read or pruned) are emitted as
//! [`tracing`] events and never routed back into the destinations. They are
//! only visible if the host installs a `tracing` subscriber, e.g.
//! `tracing_subscriber::fmt::init()`; without one they are dropped.
//!
//! ## Usage
//!
//! ```no_run
//! use sinklog::config::Config;
//! use sinklog::logging::{Logger, SeverityPreset};
//!
//! let logger = Logger::new();
//! logger.init_with(
//!     Config::new(cfg!(debug_assertions))
//!         .with_app_id("com.example.notes")
//!         .with_preset(SeverityPreset::ReleaseAdvanced)
//!         .with_file_write_path("/var/cache/notes"),
//! );
//!
//! logger.info("started");
//! ```

pub mod config;
pub mod logging;

pub use config::Config;
pub use logging::{Logger, Severity, SeverityPreset};
