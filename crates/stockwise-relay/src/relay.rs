//! Upstream invocation and response normalization

use crate::error::{RelayError, Result};
use crate::prompt::{AnalysisPrompt, PromptBuilder};
use crate::request::parse_batch;
use std::sync::Arc;
use std::time::Instant;
use stockwise_llm::{CompletionRequest, LLMProvider, Message, providers};
use stockwise_quotes::StockEntry;
use stockwise_utils::RelayConfig;
use tracing::{debug, info, warn};

/// Report text used when the provider answers without any content
pub const NO_REPORT_GENERATED: &str = "No report generated";

/// Stateless report relay
///
/// Holds only immutable configuration and the provider handle, so one
/// instance can serve any number of concurrent invocations.
pub struct ReportRelay {
    config: RelayConfig,
    provider: Arc<dyn LLMProvider>,
    prompts: PromptBuilder,
}

impl ReportRelay {
    /// Create a relay around an existing provider
    pub fn new(config: RelayConfig, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            config,
            provider,
            prompts: PromptBuilder::new(),
        }
    }

    /// Create a relay with the provider selected by `config`
    pub fn from_config(config: RelayConfig) -> Result<Self> {
        let provider = providers::from_config(&config)?;
        Ok(Self::new(config, provider))
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Validate a raw request body and generate a report for it
    pub async fn handle(&self, body: &[u8]) -> Result<String> {
        let batch = parse_batch(body)?;
        self.generate(&batch).await
    }

    /// Generate a report for an already-parsed batch
    pub async fn generate(&self, batch: &[StockEntry]) -> Result<String> {
        if batch.is_empty() {
            return Err(RelayError::NoStockData);
        }

        let prompt = self.prompts.build(batch)?;
        debug!(entries = batch.len(), prompt = %prompt.user, "Built analysis prompt");

        self.invoke(prompt).await
    }

    async fn invoke(&self, prompt: AnalysisPrompt) -> Result<String> {
        let request = CompletionRequest::builder(&self.config.model)
            .system(prompt.system)
            .add_message(Message::user(prompt.user))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build();

        let limit = self.config.upstream_timeout;
        let started = Instant::now();
        info!(
            provider = %self.config.provider,
            model = %self.config.model,
            "Requesting report"
        );

        let response = match tokio::time::timeout(limit, self.provider.complete(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(
                    error = %e,
                    status = ?e.upstream_status(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Upstream request failed"
                );
                return Err(e.into());
            }
            Err(_) => {
                warn!(timeout = ?limit, "Upstream request timed out");
                return Err(RelayError::Timeout(limit));
            }
        };

        let report = match response.text() {
            Some(text) => text.to_string(),
            None => {
                warn!("Upstream returned no completion text");
                NO_REPORT_GENERATED.to_string()
            }
        };

        info!(
            elapsed_ms = started.elapsed().as_millis(),
            tokens = response.usage.map(|u| u.total()),
            "Report generated"
        );
        Ok(report)
    }
}
