//! Structured logging for the prompt optimization engine.
//!
//! Phase 0 scaffolding for `metrics`/`replay`/`health` remains: nothing in
//! this engine currently exports metrics, replays cached runs, or reports
//! health, so those modules stay empty rather than grow speculative APIs.

#![warn(missing_docs, clippy::pedantic)]

mod tracing_support;

pub use tracing_support::{init_subscriber, LoggingToggle, DEFAULT_LOG_FILTER};

pub mod metrics {
    //! Metrics exporter configuration.
}

pub mod replay {
    //! Replay and deterministic debugging utilities.
}

pub mod health {
    //! Health reporting utilities.
}
