//! Concrete LLM provider implementations
//!
//! This module contains implementations of the LLMProvider trait for the
//! supported LLM services, plus the pieces they share: building a provider
//! from [`RelayConfig`] and turning an error response into an [`LLMError`].

pub mod gemini;
pub mod openai;

#[cfg(test)]
mod upstream_stub;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use openai::{OpenAIConfig, OpenAIProvider};

use crate::{LLMError, LLMProvider, Result};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use stockwise_utils::{ProviderKind, RelayConfig};

/// Build the provider selected by `config`
pub fn from_config(config: &RelayConfig) -> Result<Arc<dyn LLMProvider>> {
    // The relay enforces upstream_timeout itself; the client timeout is a backstop.
    let timeout_secs = config.upstream_timeout.as_secs().saturating_add(5);
    let api_base = config.api_base.as_str().trim_end_matches('/').to_string();

    let provider: Arc<dyn LLMProvider> = match config.provider {
        ProviderKind::OpenAI => Arc::new(OpenAIProvider::with_config(
            OpenAIConfig::new(config.api_key.clone())
                .with_api_base(api_base)
                .with_timeout(timeout_secs),
        )?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::with_config(
            GeminiConfig::new(config.api_key.clone())
                .with_api_base(api_base)
                .with_timeout(timeout_secs),
        )?),
    };

    Ok(provider)
}

/// Read a list that may be absent or `null` as empty
pub(crate) fn null_as_empty<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}

// Both OpenAI and Gemini report failures as `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Map a non-success provider response to an error
///
/// Uses the provider's own `error.message` when the body carries one and
/// falls back to `API error: <status>` otherwise.
pub(crate) fn error_from_status(status: u16, body: &str) -> LLMError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("API error: {status}"));

    LLMError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_message_from_body() {
        let body = r#"{"error": {"message": "The model is overloaded", "type": "server_error"}}"#;
        let err = error_from_status(503, body);
        assert_eq!(err.to_string(), "The model is overloaded");
        assert_eq!(err.upstream_status(), Some(503));
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_from_status(500, "<html>oops</html>").to_string(), "API error: 500");
        assert_eq!(error_from_status(502, r#"{"error": {}}"#).to_string(), "API error: 502");
    }

    #[test]
    fn test_auth_and_rate_limit_messages_pass_through() {
        let err = error_from_status(401, r#"{"error": {"message": "Incorrect API key provided"}}"#);
        assert_eq!(err.to_string(), "Incorrect API key provided");
        assert_eq!(err.upstream_status(), Some(401));

        let err = error_from_status(429, r#"{"error": {"message": "Rate limit reached"}}"#);
        assert_eq!(err.to_string(), "Rate limit reached");
        assert_eq!(error_from_status(429, "").to_string(), "API error: 429");
    }

    #[test]
    fn test_from_config_selects_provider() {
        let config = RelayConfig::new(ProviderKind::Gemini, "g-key")
            .with_upstream_timeout(Duration::from_secs(5));
        let provider = from_config(&config).unwrap();
        assert_eq!(provider.name(), "gemini");

        let config = RelayConfig::new(ProviderKind::OpenAI, "sk");
        let provider = from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
