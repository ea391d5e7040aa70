//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Request content rejected by a use case
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Inference/AI error
    #[error("Inference error: {0}")]
    Inference(String),

    /// Every provider reported overload or rate limiting
    #[error("Upstream saturated: {0}")]
    UpstreamSaturated(String),

    /// AI output could not be interpreted
    #[error("Invalid AI response: {reason}")]
    InvalidAiResponse { reason: String, preview: String },

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Registration with an email that already exists
    #[error("Email already registered")]
    EmailTaken,

    /// Unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, invalid or expired credentials
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Persistence failure
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Whether trying another provider could succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamSaturated(_)
                | Self::ExternalService(_)
                | Self::Inference(_)
                | Self::InvalidAiResponse { .. }
        )
    }

    pub const fn is_saturation(&self) -> bool {
        matches!(self, Self::UpstreamSaturated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_convert() {
        let err: ApplicationError = DomainError::WeakPassword("short".to_string()).into();
        assert!(matches!(err, ApplicationError::Domain(_)));
        assert_eq!(err.to_string(), "Weak password: short");
    }

    #[test]
    fn provider_failures_are_retryable() {
        assert!(ApplicationError::UpstreamSaturated("groq".to_string()).is_retryable());
        assert!(
            ApplicationError::InvalidAiResponse {
                reason: "not xml".to_string(),
                preview: String::new()
            }
            .is_retryable()
        );
        assert!(!ApplicationError::EmailTaken.is_retryable());
        assert!(!ApplicationError::Configuration("x".to_string()).is_retryable());
    }
}
