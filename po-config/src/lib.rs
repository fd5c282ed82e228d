//! Environment-backed configuration for the prompt optimization engine.
//!
//! Assembles an [`EngineConfig`] from per-adapter credentials and base URLs,
//! failing fast on a missing credential rather than surfacing it lazily on
//! the first inference call.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{is_known_mode, EngineConfig, VendorRequest, DEFAULT_RATE_LIMIT_PER_SECOND, KNOWN_OPTIMIZER_MODES};
