//! Error types for inference evaluation.

use thiserror::Error;

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, EvaluatorError>;

/// Errors raised while running inference or scoring a prompt.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The underlying inference runner failed.
    #[error("inference run failed: {0}")]
    Runner(#[from] po_runner::RunnerError),

    /// Underlying I/O failure while saving evaluation results.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },

    /// Serialization failure while saving evaluation results.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}
