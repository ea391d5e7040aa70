//! Inference errors

use thiserror::Error;

/// Errors that can occur while talking to an AI provider
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to connect to the provider
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request could not be built or sent
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API key rejected
    #[error("Provider rejected credentials")]
    Unauthorized,

    /// Model unknown to the provider
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider returned no content
    #[error("Empty completion from {0}")]
    EmptyCompletion(String),

    /// Request exceeded the client timeout
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),

    /// Provider-side rate limit (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider returned a non-success status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },
}

impl InferenceError {
    /// Map a transport error, reporting the configured timeout on expiry
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }

    /// Whether the provider is overloaded rather than misbehaving
    pub const fn is_saturation(&self) -> bool {
        match self {
            Self::RateLimited => true,
            Self::ServerError { status, .. } => matches!(*status, 502 | 503 | 529),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturation_covers_rate_limit_and_overload() {
        assert!(InferenceError::RateLimited.is_saturation());
        assert!(
            InferenceError::ServerError {
                status: 503,
                message: "over capacity".to_string()
            }
            .is_saturation()
        );
        assert!(
            !InferenceError::ServerError {
                status: 500,
                message: "boom".to_string()
            }
            .is_saturation()
        );
        assert!(!InferenceError::Timeout(1000).is_saturation());
        assert!(!InferenceError::Unauthorized.is_saturation());
    }

    #[test]
    fn server_error_message() {
        let err = InferenceError::ServerError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Server error 502: bad gateway");
    }
}
