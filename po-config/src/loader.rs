//! Per-adapter credential and base-URL loading from the environment.

use po_adapters::anthropic::{AnthropicConfig, ANTHROPIC_API_KEY_ENV};
use po_adapters::gemini::{GeminiConfig, GEMINI_API_KEY_ENV};
use po_adapters::ollama::OllamaConfig;
use po_adapters::openai::{OpenAiConfig, OPENAI_API_KEY_ENV};

use crate::error::{ConfigError, ConfigResult};

/// Base URL override for the local `Ollama` daemon, if set.
pub const OLLAMA_BASE_URL_ENV: &str = "OLLAMA_BASE_URL";

/// Loads Anthropic configuration for `model`, failing if `ANTHROPIC_API_KEY`
/// is unset.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCredential`] if the key is absent.
pub fn anthropic_config(model: impl Into<String>) -> ConfigResult<AnthropicConfig> {
    require_env("anthropic", ANTHROPIC_API_KEY_ENV)?;
    Ok(AnthropicConfig::from_env(model))
}

/// Loads Gemini configuration for `model`, failing if `GEMINI_API_KEY` is
/// unset.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCredential`] if the key is absent.
pub fn gemini_config(model: impl Into<String>) -> ConfigResult<GeminiConfig> {
    require_env("gemini", GEMINI_API_KEY_ENV)?;
    Ok(GeminiConfig::from_env(model))
}

/// Loads OpenAI configuration for `model`, failing if `OPENAI_API_KEY` is
/// unset.
///
/// # Errors
///
/// Returns [`ConfigError::MissingCredential`] if the key is absent.
pub fn openai_config(model: impl Into<String>) -> ConfigResult<OpenAiConfig> {
    require_env("openai", OPENAI_API_KEY_ENV)?;
    Ok(OpenAiConfig::from_env(model))
}

/// Builds `Ollama` configuration for `model`. No credential is required
/// (the daemon is assumed local); `OLLAMA_BASE_URL` optionally overrides the
/// default `http://127.0.0.1:11434/`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if `OLLAMA_BASE_URL` is set but is not a
/// valid URL.
pub fn ollama_config(model: impl Into<String>) -> ConfigResult<OllamaConfig> {
    let config = OllamaConfig::new(model);
    match std::env::var(OLLAMA_BASE_URL_ENV) {
        Ok(base_url) => config.with_base_url(&base_url).map_err(|err| ConfigError::Invalid {
            key: OLLAMA_BASE_URL_ENV,
            reason: err.to_string(),
        }),
        Err(_) => Ok(config),
    }
}

fn require_env(adapter: &'static str, env_var: &'static str) -> ConfigResult<()> {
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::MissingCredential { adapter, env_var }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_anthropic_key_fails_at_load_time() {
        std::env::remove_var(ANTHROPIC_API_KEY_ENV);
        let err = anthropic_config("claude-3-5-sonnet-20241022").expect_err("should require key");
        assert!(matches!(err, ConfigError::MissingCredential { adapter: "anthropic", .. }));
    }

    #[test]
    fn ollama_needs_no_credential() {
        std::env::remove_var(OLLAMA_BASE_URL_ENV);
        assert!(ollama_config("llama3").is_ok());
    }
}
