//! Error taxonomy for prompt optimization.

use thiserror::Error;

/// Errors raised while optimizing a prompt template.
#[derive(Debug, Error)]
pub enum OptimizerError {
    /// The prompter/proposer model never returned a parseable response
    /// across the retry budget.
    #[error("optimization failed: {0}")]
    Optimization(String),

    /// A required adapter was not supplied to an optimizer that needs it.
    #[error("missing inference adapter: {0}")]
    MissingAdapter(String),

    /// `custom` mode was selected without all required parameters, or a
    /// required value was absent/malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Rendering the current or candidate prompt failed.
    #[error("prompt error: {0}")]
    Prompt(#[from] po_template::PromptError),

    /// Running inference over the dataset failed.
    #[error("inference run failed: {0}")]
    Runner(#[from] po_runner::RunnerError),

    /// An adapter call exhausted its retry budget or hit a fatal error.
    #[error("adapter call failed: {0}")]
    Adapter(#[from] po_adapters::traits::AdapterError),
}

/// Crate-scoped result alias.
pub type Result<T> = std::result::Result<T, OptimizerError>;
