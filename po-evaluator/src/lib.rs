//! Scores prompt templates against a dataset, memoizing inference across
//! repeated evaluation calls.

#![warn(missing_docs, clippy::pedantic)]

mod cache;
mod error;
mod evaluator;
mod result;

/// Process-scoped inference memoization.
pub use cache::{InferenceCache, InferenceCacheKey};
/// Error type and result alias shared across this crate.
pub use error::{EvaluatorError, Result};
/// The evaluator itself.
pub use evaluator::Evaluator;
/// Inference and evaluation result types.
pub use result::{EvaluationResult, InferenceResult};
