//! Aggregate engine configuration assembled from the environment.

use po_adapters::anthropic::AnthropicConfig;
use po_adapters::gemini::GeminiConfig;
use po_adapters::ollama::OllamaConfig;
use po_adapters::openai::OpenAiConfig;

use crate::error::ConfigResult;
use crate::loader;

/// Default requests-per-second passed to
/// [`po_adapters::rate_limiter::RateLimiter::new`] when a caller does not
/// override it.
pub const DEFAULT_RATE_LIMIT_PER_SECOND: f64 = 5.0;

/// Named optimizer mode presets recognized by `po-optimizer`'s
/// `resolve_named_mode`. Kept here so a config file can validate a mode name
/// before handing it to the optimizer.
pub const KNOWN_OPTIMIZER_MODES: &[&str] = &["micro", "lite", "pro", "premier"];

/// Returns `true` if `mode` is either a recognized preset name or `"custom"`.
#[must_use]
pub fn is_known_mode(mode: &str) -> bool {
    mode == "custom" || KNOWN_OPTIMIZER_MODES.contains(&mode)
}

/// One cloud adapter to configure from the environment, paired with the
/// model id it should address.
#[derive(Debug, Clone)]
pub enum VendorRequest {
    /// Configure the Anthropic adapter for `model`.
    Anthropic {
        /// Model id, e.g. `claude-3-5-sonnet-20241022`.
        model: String,
    },
    /// Configure the Gemini adapter for `model`.
    Gemini {
        /// Model id, e.g. `gemini-1.5-pro`.
        model: String,
    },
    /// Configure the OpenAI adapter for `model`.
    OpenAi {
        /// Model id, e.g. `gpt-4o`.
        model: String,
    },
    /// Configure the local Ollama adapter for `model`.
    Ollama {
        /// Model id, e.g. `llama3`.
        model: String,
    },
}

/// Adapter credentials and base URLs, the rate-limiter target, and whichever
/// of those were actually requested by the caller.
///
/// Only the vendors named in the [`VendorRequest`] list passed to
/// [`EngineConfig::load`] are populated; an unrequested vendor's field stays
/// `None` rather than failing for a credential nobody asked for.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Requests per second handed to each adapter's rate limiter.
    pub rate_limit_per_second: f64,
    /// Anthropic configuration, if requested.
    pub anthropic: Option<AnthropicConfig>,
    /// Gemini configuration, if requested.
    pub gemini: Option<GeminiConfig>,
    /// OpenAI configuration, if requested.
    pub openai: Option<OpenAiConfig>,
    /// Ollama configuration, if requested.
    pub ollama: Option<OllamaConfig>,
}

impl EngineConfig {
    /// Loads configuration for exactly the vendors named in `requests`,
    /// reading credentials from the environment.
    ///
    /// A missing credential surfaces as a [`crate::ConfigError`] here, at
    /// load time, rather than lazily the first time an adapter is called.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingCredential`] if a requested cloud
    /// vendor's API key is unset, or [`crate::ConfigError::Invalid`] if
    /// `OLLAMA_BASE_URL` is set but malformed.
    pub fn load(requests: &[VendorRequest]) -> ConfigResult<Self> {
        let mut config = Self {
            rate_limit_per_second: DEFAULT_RATE_LIMIT_PER_SECOND,
            ..Self::default()
        };
        for request in requests {
            match request {
                VendorRequest::Anthropic { model } => {
                    config.anthropic = Some(loader::anthropic_config(model.clone())?);
                }
                VendorRequest::Gemini { model } => {
                    config.gemini = Some(loader::gemini_config(model.clone())?);
                }
                VendorRequest::OpenAi { model } => {
                    config.openai = Some(loader::openai_config(model.clone())?);
                }
                VendorRequest::Ollama { model } => {
                    config.ollama = Some(loader::ollama_config(model.clone())?);
                }
            }
        }
        Ok(config)
    }

    /// Overrides the default rate-limiter target.
    #[must_use]
    pub fn with_rate_limit_per_second(mut self, rate: f64) -> Self {
        self.rate_limit_per_second = rate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrequested_vendors_stay_unset() {
        std::env::set_var(po_adapters::anthropic::ANTHROPIC_API_KEY_ENV, "test-key");
        let config = EngineConfig::load(&[VendorRequest::Anthropic {
            model: "claude-3-5-sonnet-20241022".to_owned(),
        }])
        .unwrap();
        assert!(config.anthropic.is_some());
        assert!(config.gemini.is_none());
        assert!(config.openai.is_none());
        assert!(config.ollama.is_none());
        std::env::remove_var(po_adapters::anthropic::ANTHROPIC_API_KEY_ENV);
    }

    #[test]
    fn recognizes_known_and_custom_modes() {
        assert!(is_known_mode("pro"));
        assert!(is_known_mode("custom"));
        assert!(!is_known_mode("bogus"));
    }
}
