//! Configuration loading errors.

use thiserror::Error;

/// Errors raised while assembling an [`crate::EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential or setting was absent or empty.
    #[error("missing required configuration for {adapter}: set {env_var}")]
    MissingCredential {
        /// Which adapter the credential belongs to.
        adapter: &'static str,
        /// The environment variable that should have supplied it.
        env_var: &'static str,
    },

    /// A present value failed to parse or validate.
    #[error("invalid configuration value for {key}: {reason}")]
    Invalid {
        /// The configuration key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Crate-scoped result alias.
pub type ConfigResult<T> = Result<T, ConfigError>;
