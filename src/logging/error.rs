//! Logging error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for logging operations
pub type LogResult<T> = Result<T, LogError>;

/// Logging errors
#[derive(Debug, Error)]
pub enum LogError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Log directory could not be prepared.
    #[error("log directory '{path}' is unavailable: {source}")]
    Directory {
        /// Directory path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Rotation error
    #[error("rotation error: {0}")]
    Rotation(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Flag store error
    #[error("flag store error: {0}")]
    FlagStore(String),

    /// Unusable strftime pattern
    #[error("invalid timestamp format '{0}'")]
    TimestampFormat(String),
}
