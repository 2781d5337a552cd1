//! Error types for the news fetch path
//!
//! Transport failures and remote rejections are kept as separate variants
//! because only transport failures are worth retrying.

use thiserror::Error;

/// Errors that can occur while fetching news
#[derive(Debug, Error)]
pub enum NewsError {
    /// Network failure, timeout, or a 5xx from the remote
    #[error("Request failed: {0}")]
    Transport(String),

    /// The remote rejected the request (bad key, bad parameters, rate limited)
    #[error("API error {status} ({code}): {message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Remote-supplied error code, e.g. `apiKeyInvalid`
        code: String,
        /// Remote-supplied human readable message
        message: String,
    },

    /// The response body did not match the expected shape
    #[error("Failed to parse API response: {0}")]
    Parse(String),
}

impl NewsError {
    /// Whether repeating the request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, NewsError::Transport(_))
    }
}

impl From<reqwest::Error> for NewsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NewsError::Transport(format!("request timed out: {}", err))
        } else if err.is_decode() {
            NewsError::Parse(err.to_string())
        } else {
            NewsError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for NewsError {
    fn from(err: serde_json::Error) -> Self {
        NewsError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_transient() {
        assert!(NewsError::Transport("connection reset".to_string()).is_transient());
        assert!(!NewsError::Parse("missing field".to_string()).is_transient());
        assert!(!NewsError::Api {
            status: 429,
            code: "rateLimited".to_string(),
            message: "slow down".to_string(),
        }
        .is_transient());
    }

    #[test]
    fn test_api_error_display_carries_remote_message() {
        let err = NewsError::Api {
            status: 401,
            code: "apiKeyInvalid".to_string(),
            message: "Your API key is invalid".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("401"));
        assert!(text.contains("apiKeyInvalid"));
        assert!(text.contains("Your API key is invalid"));
    }

    #[test]
    fn test_json_error_maps_to_parse() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(NewsError::from(err), NewsError::Parse(_)));
    }
}
