//! Error types for the dataset model.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, DatasetError>;

/// Errors that can occur while building, loading, or splitting a
/// [`crate::Dataset`].
#[derive(Debug, Error)]
pub enum DatasetError {
    /// More than one output column was declared, or a record failed the
    /// single-output-column invariant.
    #[error("invalid dataset: {reason}")]
    Invalid {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A split percentage outside `(0, 1)` was requested.
    #[error("invalid split percentage {percentage}: must be in (0, 1)")]
    InvalidSplit {
        /// The offending percentage.
        percentage: f64,
    },

    /// Underlying I/O failure while reading a dataset file.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },

    /// JSONL line failed to parse as JSON.
    #[error("failed to parse JSONL record: {source}")]
    Json {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },

    /// CSV row failed to parse.
    #[error("failed to parse CSV record: {source}")]
    Csv {
        /// Source [`csv::Error`].
        #[from]
        source: csv::Error,
    },
}

impl DatasetError {
    /// Builds a [`DatasetError::Invalid`] from any displayable reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}
