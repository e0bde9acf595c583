//! Polygon.io previous-close client

use crate::aggregator::QuoteSource;
use crate::error::{MarketDataError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use stockwise_utils::QuoteConfig;
use tracing::{debug, instrument};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Polygon.io API client
#[derive(Debug, Clone)]
pub struct PolygonClient {
    client: Client,
    config: QuoteConfig,
    rate_limiter: SharedRateLimiter,
}

/// Previous trading session bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviousClose {
    pub open: f64,
    pub close: f64,
    /// Start of the session window
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    results: Option<Vec<AggregateBar>>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    o: f64,
    c: f64,
    t: Option<i64>,
}

impl PolygonClient {
    /// Create a new client
    ///
    /// Requests are paced by a limiter allowing `rate_limit_per_minute` calls
    /// per minute (5 on Polygon's free tier).
    pub fn new(config: QuoteConfig) -> Result<Self> {
        config.validate()?;

        let per_minute = NonZeroU32::new(config.rate_limit_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    fn prev_url(&self, ticker: &str) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/prev",
            self.config.api_base.as_str().trim_end_matches('/'),
            ticker
        )
    }

    /// Get the previous trading day's bar for `ticker`
    ///
    /// Returns `Ok(None)` when Polygon answers successfully but has no bar.
    #[instrument(skip(self))]
    pub async fn previous_close(&self, ticker: &str) -> Result<Option<PreviousClose>> {
        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(self.prev_url(ticker))
            .query(&[("adjusted", "true"), ("apiKey", self.config.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MarketDataError::Api {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let bar = parse_previous_close(&body)?;
        debug!(found = bar.is_some(), "Polygon previous close");
        Ok(bar)
    }
}

#[async_trait]
impl QuoteSource for PolygonClient {
    async fn previous_close(&self, ticker: &str) -> Result<Option<PreviousClose>> {
        PolygonClient::previous_close(self, ticker).await
    }
}

fn parse_previous_close(body: &str) -> Result<Option<PreviousClose>> {
    let parsed: AggregatesResponse = serde_json::from_str(body)?;

    Ok(parsed.results.into_iter().flatten().next().map(|bar| PreviousClose {
        open: bar.o,
        close: bar.c,
        timestamp: bar.t.and_then(DateTime::from_timestamp_millis),
    }))
}
