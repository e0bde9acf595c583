//! Error types for LLM operations

use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// Provider answered with a non-success status
    ///
    /// `message` is the provider's own error message when the body carried
    /// one, otherwise `API error: <status>`.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The HTTP client gave up waiting for the provider
    #[error("Request to provider timed out")]
    Timeout,

    /// Provider unreachable or connection dropped
    #[error("HTTP error: {0}")]
    HttpError(reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LLMError::Timeout
        } else {
            // Request URLs may carry credentials in the query string.
            LLMError::HttpError(err.without_url())
        }
    }
}

impl LLMError {
    /// HTTP status reported by the provider, if the provider answered at all
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            LLMError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_provider_message() {
        let err = LLMError::Api {
            status: 500,
            message: "The server had an error".to_string(),
        };
        assert_eq!(err.to_string(), "The server had an error");
        assert_eq!(err.upstream_status(), Some(500));
    }

    #[test]
    fn test_transport_errors_have_no_status() {
        assert_eq!(LLMError::Timeout.upstream_status(), None);
        assert_eq!(
            LLMError::UnexpectedResponse("bad".to_string()).upstream_status(),
            None
        );
    }
}
