//! Request validation
//!
//! [`ValidationLayer`] buffers a JSON body, checks it against a
//! [`ValidationSchema`], sanitises the declared string fields and hands the
//! rewritten body to the next layer. [`ValidatedJson`] then deserialises it
//! with errors reported in the API envelope.

mod injection;
mod sanitize;
mod schema;

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{FromRequest, Request},
    http::{Method, header::CONTENT_LENGTH},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::{Layer, Service};
use tracing::{debug, warn};

pub use injection::{InjectionKind, looks_like_script_injection, looks_like_sql_injection, scan};
pub use sanitize::sanitize;
pub use schema::{
    CustomCheck, FieldKind, FieldRule, ItemKind, ValidationSchema, Violation, lookup, validate,
};

use crate::error::ApiError;

const INVALID_BODY: &str = "Corpo della richiesta non valido";

/// Layer that validates and sanitises JSON bodies
#[derive(Clone, Debug)]
pub struct ValidationLayer {
    schema: Arc<ValidationSchema>,
    max_body_bytes: usize,
}

impl ValidationLayer {
    #[must_use]
    pub fn new(schema: ValidationSchema, max_body_bytes: usize) -> Self {
        Self {
            schema: Arc::new(schema),
            max_body_bytes,
        }
    }
}

impl<S> Layer<S> for ValidationLayer {
    type Service = Validation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Validation {
            inner,
            schema: Arc::clone(&self.schema),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Validation<S> {
    inner: S,
    schema: Arc<ValidationSchema>,
    max_body_bytes: usize,
}

impl<S> Service<Request> for Validation<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let schema = Arc::clone(&self.schema);
        let max_body_bytes = self.max_body_bytes;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !carries_body(req.method()) {
                return inner.call(req).await;
            }

            match prepare(req, &schema, max_body_bytes).await {
                Ok(req) => inner.call(req).await,
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}

fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

async fn prepare(
    req: Request,
    schema: &ValidationSchema,
    max_body_bytes: usize,
) -> Result<Request, ApiError> {
    let (mut parts, body) = req.into_parts();
    let bytes = to_bytes(body, max_body_bytes).await.map_err(|e| {
        warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
        ApiError::PayloadTooLarge
    })?;

    let mut value: Value = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::BadRequest(INVALID_BODY.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::BadRequest(INVALID_BODY.to_string()));
    }

    let violations = validate(&value, schema);
    if !violations.is_empty() {
        debug!(
            path = %parts.uri.path(),
            fields = ?violations.iter().map(|v| v.field.as_str()).collect::<Vec<_>>(),
            "Validation failed"
        );
        return Err(ApiError::Validation { violations });
    }

    schema.sanitize(&mut value);
    for field in schema.text_fields() {
        if let Some(kind) = lookup(&value, field).and_then(Value::as_str).and_then(scan) {
            warn!(path = %parts.uri.path(), field, kind = %kind, "Suspicious input pattern");
        }
    }

    let rewritten = serde_json::to_vec(&value).map_err(|e| ApiError::Internal(e.to_string()))?;
    parts.headers.remove(CONTENT_LENGTH);
    Ok(Request::from_parts(parts, Body::from(rewritten)))
}

/// JSON extractor whose rejection uses the API error envelope
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            debug!(error = %e, "JSON body rejected");
            ApiError::BadRequest(INVALID_BODY.to_string())
        })?;
        Ok(Self(value))
    }
}
