//! Request validation and the response contract

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use stockwise_quotes::StockEntry;
use tracing::debug;

/// Body of a report request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub stock_data: Option<Vec<StockEntry>>,
}

/// The relay's only externally visible output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportResponse {
    Report { report: String },
    Error { error: String },
}

impl ReportResponse {
    pub fn report(text: impl Into<String>) -> Self {
        ReportResponse::Report {
            report: text.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ReportResponse::Error {
            error: message.into(),
        }
    }
}

/// Parse a raw body into a non-empty batch
///
/// Unparsable bodies take the same path as a missing batch.
pub fn parse_batch(body: &[u8]) -> Result<Vec<StockEntry>> {
    let request: ReportRequest = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Rejecting unparsable request body");
        RelayError::NoStockData
    })?;

    match request.stock_data {
        Some(batch) if !batch.is_empty() => Ok(batch),
        _ => Err(RelayError::NoStockData),
    }
}
