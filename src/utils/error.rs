//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// A single event record that could not be normalized.
///
/// Never fatal: the loader skips the record and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record {index}: {reason}")]
pub struct MalformedRecordError {
    /// Position of the record in the raw source (0-based)
    pub index: usize,

    /// Human-readable cause
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while loading the event log
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read event source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event source is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No valid events in source ({skipped} records skipped)")]
    EmptyInput { skipped: usize },
}

/// Errors that can occur while loading analysis configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
