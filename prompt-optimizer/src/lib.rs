//! Prompt optimization engine facade.
//!
//! Depend on this crate via `cargo add prompt-optimizer`. It bundles the
//! internal engine crates behind feature flags so downstream users can
//! enable or disable components as needed.

#![warn(missing_docs, clippy::pedantic)]

/// Dataset loading and splitting (enabled by `dataset` feature).
#[cfg(feature = "dataset")]
pub use po_dataset as dataset;

/// Prompt templates and variable substitution (enabled by `template` feature).
#[cfg(feature = "template")]
pub use po_template as template;

/// LLM inference adapters (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use po_adapters as adapters;

/// Concurrent, rate-limited inference running (enabled by `runner` feature).
#[cfg(feature = "runner")]
pub use po_runner as runner;

/// Prompt evaluation with cross-run memoization (enabled by `evaluator` feature).
#[cfg(feature = "evaluator")]
pub use po_evaluator as evaluator;

/// Meta-prompter and search-based optimizers (enabled by `optimizer` feature).
#[cfg(feature = "optimizer")]
pub use po_optimizer as optimizer;

/// Environment-backed configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use po_config as config;

/// Structured logging (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use po_telemetry as telemetry;
