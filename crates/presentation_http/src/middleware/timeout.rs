//! Request deadline
//!
//! The handler runs as its own task and races a timer. When the timer wins
//! the client gets a 504 and the task is left to finish on its own; it is
//! never aborted. A handler that has already committed its outcome (through
//! [`ResponseCommit`]) is awaited instead, so its real response goes out.

use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};
use tracing::{Instrument, debug, error, warn};

use crate::error::ApiError;

/// Flag a handler sets once its side effects are done and its response is
/// decided. Extracted from the request; a fresh one when no layer added it.
#[derive(Debug, Clone, Default)]
pub struct ResponseCommit(Arc<AtomicBool>);

impl ResponseCommit {
    pub fn mark(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_committed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ResponseCommit {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

#[derive(Clone, Debug)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = Timeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Timeout {
            inner,
            timeout: self.timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Timeout<S> {
    inner: S,
    timeout: Duration,
}

impl<S> Service<Request> for Timeout<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let commit = ResponseCommit::default();
        req.extensions_mut().insert(commit.clone());

        let timeout = self.timeout;
        let path = req.uri().path().to_string();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut handle =
                tokio::spawn(async move { inner.call(req).await }.in_current_span());

            tokio::select! {
                joined = &mut handle => return settle(joined),
                () = tokio::time::sleep(timeout) => {},
            }

            if commit.is_committed() {
                debug!(path = %path, "Deadline passed after commit, awaiting handler");
                return settle(handle.await);
            }

            warn!(path = %path, timeout_ms = timeout.as_millis(), "Request exceeded deadline");
            Ok(ApiError::GatewayTimeout.into_response())
        })
    }
}

fn settle<E>(joined: Result<Result<Response, E>, tokio::task::JoinError>) -> Result<Response, E> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Handler task failed");
            Ok(ApiError::Internal("handler task failed".to_string()).into_response())
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn app(timeout: Duration) -> Router {
        Router::new()
            .route("/fast", get(|| async { "fast" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "slow"
                }),
            )
            .route(
                "/committed",
                get(|commit: ResponseCommit| async move {
                    commit.mark();
                    tokio::time::sleep(Duration::from_millis(80)).await;
                    (StatusCode::CREATED, "done")
                }),
            )
            .layer(TimeoutLayer::new(timeout))
    }

    fn get_request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn fast_handler_result_is_untouched() {
        let response = app(Duration::from_secs(1))
            .oneshot(get_request("/fast"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fast");
    }

    #[tokio::test]
    async fn slow_handler_yields_gateway_timeout() {
        let response = app(Duration::from_millis(20))
            .oneshot(get_request("/slow"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["error"],
            "La richiesta ha superato il tempo massimo di elaborazione"
        );
        assert_eq!(body["code"], "gateway_timeout");
    }

    #[tokio::test]
    async fn committed_handler_is_not_replaced() {
        let response = app(Duration::from_millis(20))
            .oneshot(get_request("/committed"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn abandoned_handler_keeps_running() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&finished);
        let app = Router::new()
            .route(
                "/work",
                get(move || {
                    let counter = Arc::clone(&counter);
                    async move {
                        tokio::time::sleep(Duration::from_millis(60)).await;
                        counter.fetch_add(1, Ordering::SeqCst);
                        "late"
                    }
                }),
            )
            .layer(TimeoutLayer::new(Duration::from_millis(10)));

        let response = app.oneshot(get_request("/work")).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
