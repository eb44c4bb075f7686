//! GCPV Watcher Library
//!
//! Keeps a FinishLynx `Lynx.evt` race list in sync with the race exports
//! written by the GCPV registration tool.
//!
//! This library provides tools for:
//! - Locating fields in GCPV export rows by label and offset
//! - Parsing and writing the two-level `Lynx.evt` race list format
//! - Deriving lap counts from track parameters
//! - Reconciling races from many export files into one authoritative file,
//!   with backups of every previous version
//! - Watching an export directory and driving reconciliation from
//!   filesystem events

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod converter;
        pub mod evt;
        pub mod export_parser;
        pub mod lap_calculator;
        pub mod race_number;
        pub mod reconciliation;
        pub mod roster;
        pub mod row_source;
        pub mod watcher;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{ExportLane, ExportRace, Race, RosterEntry};
pub use config::AppConfig;

/// Result type alias for the GCPV watcher
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for GCPV watcher operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Malformed input; aborts the whole parse call
    #[error("Format error: {message}")]
    Format { message: String },

    /// A single race or lane entry could not be converted
    #[error("Conversion error: {message}")]
    Conversion { message: String },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File or directory not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// CSV reader or writer failure
    #[error("CSV error: {message}")]
    Csv {
        message: String,
        #[source]
        source: csv::Error,
    },

    /// A time-bounded startup step did not finish
    #[error("Timed out after {seconds:.1}s: {operation}")]
    Timeout { operation: String, seconds: f64 },

    /// Filesystem notification backend failure
    #[error("File watcher error: {message}")]
    Watcher {
        message: String,
        #[source]
        source: notify::Error,
    },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a conversion error
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a CSV error with context
    pub fn csv(message: impl Into<String>, source: csv::Error) -> Self {
        Self::Csv {
            message: message.into(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, limit: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            seconds: limit.as_secs_f64(),
        }
    }

    /// Create a watcher error
    pub fn watcher(message: impl Into<String>, source: notify::Error) -> Self {
        Self::Watcher {
            message: message.into(),
            source,
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Errors that must stop the watcher rather than be reported and skipped
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Timeout { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::Csv {
            message: "CSV processing failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid configuration JSON: {}", error),
        }
    }
}

impl From<notify::Error> for Error {
    fn from(error: notify::Error) -> Self {
        Self::Watcher {
            message: "File watcher failed".to_string(),
            source: error,
        }
    }
}
