//! OpenAI provider implementation
//!
//! This module implements the LLMProvider trait for OpenAI's chat completions
//! endpoint. See: https://platform.openai.com/docs/api-reference/chat
//!
//! Any OpenAI-compatible server (LM Studio, vLLM, llama.cpp, Azure OpenAI)
//! works through a custom `api_base`.
//!
//! # Example
//!
//! ```no_run
//! use stockwise_llm::{CompletionRequest, LLMProvider, Message};
//! use stockwise_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OpenAIConfig::new("sk-...")
//!     .with_api_base("http://localhost:1234/v1")
//!     .with_timeout(60);
//! let provider = OpenAIProvider::with_config(config)?;
//!
//! let request = CompletionRequest::builder("gpt-4o-mini")
//!     .system("You are a professional financial analyst.")
//!     .add_message(Message::user("AAA: Open $100, Close $110"))
//!     .build();
//!
//! let response = provider.complete(request).await?;
//! println!("{}", response.text().unwrap_or("No report generated"));
//! # Ok(())
//! # }
//! ```

use super::error_from_status;
use crate::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, Result, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for OpenAI provider
#[derive(Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the OpenAI API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

/// OpenAI provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a new OpenAI provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let openai_request = OpenAIRequest::from(request);
        debug!(messages = openai_request.messages.len(), "Sending request to OpenAI API");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "OpenAI API returned an error");
            return Err(error_from_status(status.as_u16(), &body));
        }

        parse_response(&body)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// OpenAI-specific request types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<Message> for OpenAIMessage {
    fn from(msg: Message) -> Self {
        Self {
            role: msg.role.as_str(),
            content: msg.content,
        }
    }
}

impl From<CompletionRequest> for OpenAIRequest {
    fn from(request: CompletionRequest) -> Self {
        // System prompt goes first in the messages array for OpenAI
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            messages.push(OpenAIMessage::from(Message::system(system)));
        }
        messages.extend(request.messages.into_iter().map(OpenAIMessage::from));

        Self {
            model: request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

// ============================================================================
// OpenAI-specific response types
// ============================================================================

// Every field is optional so that a successful response with an unexpected
// shape degrades to "no text" instead of failing.
#[derive(Debug, Default, Deserialize)]
struct OpenAIResponse {
    #[serde(default, deserialize_with = "super::null_as_empty")]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: Option<usize>,
    completion_tokens: Option<usize>,
}

fn parse_response(body: &str) -> Result<CompletionResponse> {
    let parsed: OpenAIResponse = serde_json::from_str(body).map_err(|e| {
        crate::LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
    })?;

    // OpenAI can return multiple choices but we use the first
    let first = parsed.choices.into_iter().next();
    let stop_reason = first
        .as_ref()
        .and_then(|c| c.finish_reason.as_deref())
        .map(map_stop_reason);
    let text = first.and_then(|c| c.message).and_then(|m| m.content);

    let usage = parsed.usage.map(|u| TokenUsage {
        input_tokens: u.prompt_tokens.unwrap_or_default(),
        output_tokens: u.completion_tokens.unwrap_or_default(),
    });

    debug!(
        has_text = text.is_some(),
        tokens = usage.map(|u| u.total()),
        "Received response from OpenAI API"
    );

    Ok(CompletionResponse {
        text,
        stop_reason,
        usage,
    })
}

/// Map OpenAI stop reason to our format
fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        other => {
            debug!("Unknown stop reason: {}", other);
            StopReason::Other
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LLMError;
    use crate::providers::upstream_stub::UpstreamStub;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn provider_for(stub: &UpstreamStub) -> OpenAIProvider {
        let config = OpenAIConfig::new("sk-test")
            .with_api_base(stub.base())
            .with_timeout(5);
        OpenAIProvider::with_config(config).unwrap()
    }

    fn report_request() -> CompletionRequest {
        CompletionRequest::builder("gpt-test")
            .system("You are a professional financial analyst.")
            .add_message(Message::user("AAA: Open $100, Close $110, Change $10 (10%)"))
            .build()
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_custom_api_base() {
        let config = OpenAIConfig::new("test-key")
            .with_api_base("http://localhost:1234/v1/")
            .with_timeout(60);
        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:1234/v1/chat/completions");
        assert_eq!(provider.config().timeout_secs, 60);
    }

    #[test]
    fn test_config_debug_hides_key() {
        let debug = format!("{:?}", OpenAIConfig::new("sk-secret"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_system_prompt_goes_first() {
        let request = CompletionRequest::builder("gpt-4o-mini")
            .system("You are a professional financial analyst.")
            .add_message(Message::user("AAA: Open $100"))
            .temperature(0.5)
            .max_tokens(256)
            .build();

        let body = serde_json::to_value(OpenAIRequest::from(request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "You are a professional financial analyst."},
                    {"role": "user", "content": "AAA: Open $100"}
                ],
                "max_tokens": 256,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_parse_first_choice() {
        let body = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Buy AAA."}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "Sell AAA."}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 40, "completion_tokens": 4}
        })
        .to_string();

        let response = parse_response(&body).unwrap();
        assert_eq!(response.text(), Some("Buy AAA."));
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.usage.map(|u| u.total()), Some(44));
    }

    #[test]
    fn test_parse_without_choices_is_not_an_error() {
        for body in [
            r#"{"choices": []}"#,
            r#"{"choices": null}"#,
            "{}",
            r#"{"choices": [{"message": null}]}"#,
            r#"{"choices": [{"message": {"content": null}}]}"#,
            r#"{"choices": null, "usage": {"prompt_tokens": null}}"#,
        ] {
            let response = parse_response(body).unwrap();
            assert_eq!(response.text(), None, "body: {body}");
        }
    }

    #[test]
    fn test_parse_non_json_body() {
        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, crate::LLMError::UnexpectedResponse(_)));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::ContentFilter);
        assert_eq!(map_stop_reason("tool_calls"), StopReason::Other);
    }

    #[tokio::test]
    async fn test_complete_posts_to_chat_completions() {
        let stub = UpstreamStub::start(
            StatusCode::OK,
            json!({"choices": [{"message": {"content": "Buy AAA."}, "finish_reason": "stop"}]}),
        )
        .await;

        let response = provider_for(&stub).complete(report_request()).await.unwrap();
        assert_eq!(response.text(), Some("Buy AAA."));

        let received = stub.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].method, Method::POST);
        assert_eq!(received[0].path, "/chat/completions");
        assert_eq!(received[0].headers.get("authorization").unwrap(), "Bearer sk-test");
        assert_eq!(received[0].body["model"], "gpt-test");
        assert_eq!(received[0].body["messages"][0]["role"], "system");
        assert_eq!(received[0].body["messages"][1]["role"], "user");
    }

    #[tokio::test]
    async fn test_error_status_is_sent_once_and_keeps_message() {
        let stub = UpstreamStub::start(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"message": "x"}}),
        )
        .await;

        let err = provider_for(&stub).complete(report_request()).await.unwrap_err();
        match err {
            LLMError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "x");
            }
            other => panic!("expected Api error, got {other:?}"),
        }

        let received = stub.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].headers.get("authorization").unwrap(), "Bearer sk-test");
    }
}
