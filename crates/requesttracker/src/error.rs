//! Error types for requesttracker.
//!
//! This module defines all error types used throughout the requesttracker crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for requesttracker operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Store Errors ===
    /// A positional update or delete referenced a record that does not exist.
    #[error("index {index} is out of range for a store of {len} records")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of records in the store when the call was made.
        len: usize,
    },

    /// A filtered view was used after the store changed underneath it.
    #[error("view is stale: taken at revision {expected}, store is at revision {actual}")]
    StaleView {
        /// Revision the view was taken at.
        expected: u64,
        /// Current store revision.
        actual: u64,
    },

    // === Persistence Errors ===
    /// The data file exists but could not be parsed.
    #[error("data file {path} is corrupt: {source}")]
    FileCorrupt {
        /// Path to the data file.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the data file failed; the change was not committed.
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        /// Path to the data file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Input Errors ===
    /// A date string supplied by the caller is not a calendar date.
    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// A status string supplied by the caller is not a known status.
    #[error("invalid request status '{value}': expected one of Open, In Progress, Closed")]
    InvalidStatus {
        /// The rejected input.
        value: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for requesttracker operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a write failure error for the given path.
    #[must_use]
    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid date error.
    #[must_use]
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }

    /// Check if this error is an out-of-range or stale-view error.
    ///
    /// Both mean the caller pointed at a record that is no longer where it
    /// thought it was, and should re-query before retrying.
    #[must_use]
    pub fn is_stale_position(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. } | Self::StaleView { .. })
    }

    /// Check if this error means the change did not reach disk.
    #[must_use]
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailure { .. } | Self::DirectoryCreate { .. })
    }
}
