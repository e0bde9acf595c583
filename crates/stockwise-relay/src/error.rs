//! Relay error type and its HTTP mapping

use crate::request::ReportResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Duration;
use stockwise_llm::LLMError;
use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Everything that can stop a relay invocation short of a report
#[derive(Debug, Error)]
pub enum RelayError {
    /// Body missing, unparsable, or `stockData` absent/empty
    #[error("No stock data provided")]
    NoStockData,

    /// Any method other than POST or OPTIONS
    #[error("Only POST requests allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    /// Provider failed: non-success status or transport failure
    #[error(transparent)]
    Upstream(#[from] LLMError),

    /// Provider did not answer within the configured bound
    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// Prompt template failed to render
    #[error("Failed to build prompt: {0}")]
    Prompt(#[from] minijinja::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Status code sent to the caller
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NoStockData => StatusCode::BAD_REQUEST,
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::Upstream(_)
            | RelayError::Timeout(_)
            | RelayError::Prompt(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ReportResponse::error(self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::NoStockData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            RelayError::Timeout(Duration::from_secs(60)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::from(LLMError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(RelayError::NoStockData.to_string(), "No stock data provided");
        assert_eq!(RelayError::MethodNotAllowed.to_string(), "Only POST requests allowed");
        assert_eq!(
            RelayError::Timeout(Duration::from_secs(30)).to_string(),
            "Upstream request timed out after 30s"
        );
        assert_eq!(
            RelayError::Timeout(Duration::from_millis(50)).to_string(),
            "Upstream request timed out after 50ms"
        );

        // Provider messages pass through untouched
        let upstream = RelayError::from(LLMError::Api {
            status: 500,
            message: "The server had an error while processing your request.".to_string(),
        });
        assert_eq!(
            upstream.to_string(),
            "The server had an error while processing your request."
        );
    }
}
