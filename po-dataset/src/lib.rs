//! Dataset model for the prompt optimization engine.
//!
//! Loads labeled examples from JSONL or CSV into a normalized
//! `{inputs, outputs}` record shape, and supports random or stratified
//! train/test splitting.

#![warn(missing_docs, clippy::pedantic)]

mod dataset;
mod error;
mod metric;
mod record;

/// The dataset model and its load/split operations.
pub use dataset::Dataset;
/// Error type and result alias shared across this crate.
pub use error::{DatasetError, Result};
/// User-supplied scoring function trait and a trivial baseline implementation.
pub use metric::{ExactMatch, Metric};
/// A single labeled example.
pub use record::DatasetRecord;
