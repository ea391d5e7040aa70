//! API error handling
//!
//! Every failure leaves the server as `{error, code, details?}` with an Italian
//! message. Internal detail strings are only attached in development posture.

use std::sync::atomic::{AtomicBool, Ordering};

use application::ApplicationError;
use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::middleware::validation::Violation;

/// Global flag to control error detail exposure
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Configure whether internal error details are included in responses.
///
/// Set to `false` in production so provider messages, SQL errors and
/// connection strings never reach the client.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

fn should_expose_details() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {} violation(s)", violations.len())]
    Validation { violations: Vec<Violation> },

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Origin rejected")]
    CsrfRejected,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
        limit: u32,
        /// Unix timestamp when the client may retry
        reset_at: i64,
    },

    #[error("Invalid AI response: {reason}")]
    InvalidAiResponse { reason: String, preview: String },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream saturated: {0}")]
    UpstreamSaturated(String),

    #[error("Gateway timeout")]
    GatewayTimeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            violations: None,
            preview: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        if should_expose_details() {
            self.details = Some(details);
        }
        self
    }
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::CsrfRejected => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidAiResponse { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) | Self::UpstreamSaturated(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            },
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn body(self) -> ErrorResponse {
        match self {
            Self::BadRequest(msg) => ErrorResponse::new(msg, "bad_request"),
            Self::Validation { violations } => ErrorResponse {
                violations: Some(violations),
                ..ErrorResponse::new("Dati non validi", "validation_error")
            },
            Self::PayloadTooLarge => {
                ErrorResponse::new("Richiesta troppo grande", "payload_too_large")
            },
            Self::Unauthorized(msg) => ErrorResponse::new(msg, "unauthorized"),
            Self::CsrfRejected => ErrorResponse::new(
                "Richiesta non autorizzata: origine non consentita",
                "csrf_rejected",
            ),
            Self::NotFound => ErrorResponse::new("Risorsa non trovata", "not_found"),
            Self::MethodNotAllowed => {
                ErrorResponse::new("Metodo non consentito", "method_not_allowed")
            },
            Self::RateLimited {
                retry_after_secs, ..
            } => ErrorResponse::new(
                format!("Troppe richieste. Riprova tra {retry_after_secs} secondi."),
                "rate_limited",
            ),
            Self::InvalidAiResponse { reason, preview } => ErrorResponse {
                preview: Some(preview),
                ..ErrorResponse::new("Risposta AI non valida", "invalid_ai_response")
                    .with_details(reason)
            },
            Self::ServiceUnavailable(msg) => {
                ErrorResponse::new("Servizio temporaneamente non disponibile", "service_unavailable")
                    .with_details(msg)
            },
            Self::UpstreamSaturated(msg) => ErrorResponse::new(
                "Servizio AI sovraccarico. Riprova tra qualche istante.",
                "upstream_saturated",
            )
            .with_details(msg),
            Self::GatewayTimeout => ErrorResponse::new(
                "La richiesta ha superato il tempo massimo di elaborazione",
                "gateway_timeout",
            ),
            Self::Internal(msg) => {
                ErrorResponse::new("Errore interno del server", "internal_error").with_details(msg)
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let rate_headers = match &self {
            Self::RateLimited {
                retry_after_secs,
                limit,
                reset_at,
            } => Some((*retry_after_secs, *limit, *reset_at)),
            _ => None,
        };

        let mut response = (status, Json(self.body())).into_response();

        if let Some((retry_after, limit, reset_at)) = rate_headers {
            let headers = response.headers_mut();
            headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(limit),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(0_u32),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-reset"),
                HeaderValue::from(reset_at),
            );
        }

        response
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(e) => Self::BadRequest(domain_message(&e)),
            ApplicationError::InvalidInput(msg) => Self::BadRequest(msg),
            ApplicationError::EmailTaken => Self::BadRequest("Email già registrata".to_string()),
            ApplicationError::InvalidCredentials => {
                Self::Unauthorized("Credenziali non valide".to_string())
            },
            ApplicationError::NotAuthorized(_) => {
                Self::Unauthorized("Token non valido o scaduto".to_string())
            },
            ApplicationError::UpstreamSaturated(msg) => Self::UpstreamSaturated(msg),
            ApplicationError::InvalidAiResponse { reason, preview } => {
                Self::InvalidAiResponse { reason, preview }
            },
            ApplicationError::Inference(msg) | ApplicationError::ExternalService(msg) => {
                Self::ServiceUnavailable(msg)
            },
            ApplicationError::Database(msg)
            | ApplicationError::Configuration(msg)
            | ApplicationError::Internal(msg) => Self::Internal(msg),
        }
    }
}

fn domain_message(err: &domain::DomainError) -> String {
    use domain::DomainError;

    match err {
        DomainError::InvalidEmailAddress(_) => "Indirizzo email non valido".to_string(),
        DomainError::WeakPassword(_) => "La password deve contenere almeno 8 caratteri, \
                                         una maiuscola, una minuscola, un numero e un simbolo"
            .to_string(),
        DomainError::InvalidWorkflowId(_) => "Identificativo processo non valido".to_string(),
        DomainError::NotFound { .. } => "Risorsa non trovata".to_string(),
        DomainError::ValidationError(msg) => msg.clone(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::BadRequest(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::CsrfRejected.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::UpstreamSaturated(String::new()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::GatewayTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn csrf_rejection_body() {
        let body = body_json(ApiError::CsrfRejected.into_response()).await;
        assert_eq!(body["error"], "Richiesta non autorizzata: origine non consentita");
        assert_eq!(body["code"], "csrf_rejected");
    }

    #[tokio::test]
    async fn rate_limited_carries_retry_headers() {
        let response = ApiError::RateLimited {
            retry_after_secs: 42,
            limit: 5,
            reset_at: 1_700_000_000,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers.get(RETRY_AFTER).unwrap(), "42");
        assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "5");
        assert_eq!(headers.get("x-ratelimit-remaining").unwrap(), "0");
        assert_eq!(headers.get("x-ratelimit-reset").unwrap(), "1700000000");
    }

    #[tokio::test]
    async fn invalid_ai_response_exposes_preview() {
        let response = ApiError::InvalidAiResponse {
            reason: "no json array".to_string(),
            preview: "Ecco i processi".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "invalid_ai_response");
        assert_eq!(body["preview"], "Ecco i processi");
    }

    #[test]
    fn email_taken_maps_to_italian_bad_request() {
        let err: ApiError = ApplicationError::EmailTaken.into();
        let ApiError::BadRequest(msg) = err else {
            unreachable!("Expected BadRequest");
        };
        assert_eq!(msg, "Email già registrata");
    }

    #[test]
    fn invalid_credentials_map_to_unauthorized() {
        let err: ApiError = ApplicationError::InvalidCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Credenziali non valide"));
    }

    #[test]
    fn saturation_maps_to_503() {
        let err: ApiError = ApplicationError::UpstreamSaturated("groq 429".to_string()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn weak_password_is_explained() {
        let err: ApiError =
            ApplicationError::Domain(domain::DomainError::WeakPassword("x".to_string())).into();
        let ApiError::BadRequest(msg) = err else {
            unreachable!("Expected BadRequest");
        };
        assert!(msg.starts_with("La password deve contenere"));
    }

    // The exposure flag is process-wide, so both postures are checked in one test.
    #[tokio::test]
    async fn internal_details_follow_posture() {
        set_expose_internal_errors(false);
        let hidden = body_json(ApiError::Internal("postgres://secret".to_string()).into_response()).await;
        set_expose_internal_errors(true);
        let shown = body_json(ApiError::Internal("postgres://secret".to_string()).into_response()).await;

        assert!(hidden.get("details").is_none());
        assert_eq!(hidden["error"], "Errore interno del server");
        assert_eq!(shown["details"], "postgres://secret");
    }
}
