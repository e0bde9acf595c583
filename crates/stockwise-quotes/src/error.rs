//! Error types for quote operations

use thiserror::Error;

/// Market data specific errors
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Polygon answered with a non-success status
    #[error("Polygon API error: {status}")]
    Api { status: u16 },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Open/close outside the non-negative finite range
    #[error("Invalid price for {ticker}: {detail}")]
    InvalidPrice { ticker: String, detail: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] stockwise_utils::ConfigError),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key as a query parameter.
        MarketDataError::Network(err.without_url())
    }
}

/// Result type alias for quote operations
pub type Result<T> = std::result::Result<T, MarketDataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MarketDataError::InvalidSymbol("$$$".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: $$$");

        let err = MarketDataError::Api { status: 403 };
        assert_eq!(err.to_string(), "Polygon API error: 403");
    }
}
