//! Sequential quote aggregation
//!
//! One lookup per ticker, strictly one after another, in list order. A
//! failed lookup becomes a [`QuoteError`] entry and never aborts the batch.

use crate::error::Result;
use crate::model::{QuoteError, QuoteRecord, StockEntry};
use crate::polygon::PreviousClose;
use crate::tickers::TickerList;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Error text for a ticker the source has no bar for
pub const NO_DATA_AVAILABLE: &str = "No data available";

/// Source of previous-session prices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the previous session's bar; `Ok(None)` means "no data"
    async fn previous_close(&self, ticker: &str) -> Result<Option<PreviousClose>>;
}

/// Builds a batch of [`StockEntry`] from a ticker list
pub struct QuoteAggregator<S> {
    source: S,
}

impl<S: QuoteSource> QuoteAggregator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Look up every ticker in order and collect the outcomes
    pub async fn collect(&self, tickers: &TickerList) -> Vec<StockEntry> {
        let mut batch = Vec::with_capacity(tickers.len());

        for ticker in tickers.iter() {
            let entry = match self.source.previous_close(ticker).await {
                Ok(Some(bar)) => match QuoteRecord::from_prices(ticker, bar.open, bar.close) {
                    Ok(record) => {
                        let session = bar.timestamp.map(|t| t.date_naive());
                        debug!(ticker, ?session, "Got previous close");
                        StockEntry::Quote(record)
                    }
                    Err(e) => {
                        warn!(ticker, error = %e, "Discarding malformed bar");
                        StockEntry::Failed(QuoteError::new(ticker, e.to_string()))
                    }
                },
                Ok(None) => StockEntry::Failed(QuoteError::new(ticker, NO_DATA_AVAILABLE)),
                Err(e) => {
                    warn!(ticker, error = %e, "Quote lookup failed");
                    StockEntry::Failed(QuoteError::new(ticker, e.to_string()))
                }
            };
            batch.push(entry);
        }

        let failed = batch.iter().filter(|e| e.is_failed()).count();
        info!(tickers = batch.len(), failed, "Collected quotes");
        batch
    }
}
