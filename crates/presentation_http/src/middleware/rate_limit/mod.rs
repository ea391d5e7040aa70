//! Rate limiting middleware
//!
//! Fixed-window counter with lockout, keyed by route-family prefix and client
//! address. State lives behind [`RateLimitStore`] so a shared store can replace
//! the in-memory table when several instances serve the same clients.

mod store;

use std::{
    future::Future,
    net::SocketAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use tokio::task::JoinHandle;
use tower::{Layer, Service};
use tracing::{debug, warn};

pub use store::{
    Decision, InMemoryRateLimitStore, RateLimitEntry, RateLimitStore, RatePolicy, step,
};

use crate::error::ApiError;

const UNKNOWN_CLIENT: &str = "unknown";

/// Identify the caller: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket address, then `"unknown"`.
pub fn client_identifier(req: &Request) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), |info| info.0.ip().to_string())
}

/// Layer that limits one route family
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    store: Arc<dyn RateLimitStore>,
    prefix: Arc<str>,
    policy: RatePolicy,
    enabled: bool,
}

impl RateLimitLayer {
    #[must_use]
    pub fn new(store: Arc<dyn RateLimitStore>, prefix: &str, policy: RatePolicy) -> Self {
        Self {
            store,
            prefix: Arc::from(prefix),
            policy,
            enabled: true,
        }
    }

    /// Pass every request through untouched
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            layer: self.clone(),
        }
    }
}

/// Middleware service for rate limiting
#[derive(Clone, Debug)]
pub struct RateLimit<S> {
    inner: S,
    layer: RateLimitLayer,
}

impl<S> Service<Request> for RateLimit<S>
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
        let layer = self.layer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !layer.enabled {
                return inner.call(req).await;
            }

            let client = client_identifier(&req);
            let key = format!("{}:{client}", layer.prefix);
            let limit = layer.policy.max_attempts;

            match layer.store.transition(&key, &layer.policy, Instant::now()).await {
                Decision::Allowed { remaining } => {
                    debug!(key = %key, remaining, "Rate limit check passed");
                    let mut response = inner.call(req).await?;
                    let headers = response.headers_mut();
                    headers.insert(
                        HeaderName::from_static("x-ratelimit-limit"),
                        HeaderValue::from(limit),
                    );
                    headers.insert(
                        HeaderName::from_static("x-ratelimit-remaining"),
                        HeaderValue::from(remaining),
                    );
                    Ok(response)
                },
                Decision::Denied { retry_after } => {
                    let retry_after_secs = retry_after_secs(retry_after);
                    warn!(key = %key, retry_after_secs, "Rate limit exceeded");
                    Ok(ApiError::RateLimited {
                        retry_after_secs,
                        limit,
                        reset_at: reset_timestamp(retry_after_secs),
                    }
                    .into_response())
                },
            }
        })
    }
}

/// Whole seconds, rounded up so a running block never reports zero
fn retry_after_secs(remaining: Duration) -> u64 {
    let secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

fn reset_timestamp(retry_after_secs: u64) -> i64 {
    let offset = i64::try_from(retry_after_secs).unwrap_or(i64::MAX);
    chrono::Utc::now().timestamp().saturating_add(offset)
}

/// Periodically sweep idle entries out of the store
pub fn spawn_cleanup_task(
    store: Arc<dyn RateLimitStore>,
    interval: Duration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep(Instant::now(), retention).await;
            if removed > 0 {
                debug!(removed, "Swept idle rate limit entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::RETRY_AFTER},
        routing::post,
    };
    use tower::ServiceExt;

    use super::*;

    async fn test_handler() -> &'static str {
        "ok"
    }

    fn router(store: Arc<dyn RateLimitStore>, max: u32, enabled: bool) -> Router {
        let policy = RatePolicy::new(max, Duration::from_secs(60), Duration::from_secs(120));
        Router::new()
            .route("/test", post(test_handler))
            .layer(RateLimitLayer::new(store, "test", policy).enabled(enabled))
    }

    fn request_from(ip: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/test")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn client_prefers_first_forwarded_hop() {
        let req = Request::builder()
            .header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&req), "203.0.113.7");
    }

    #[test]
    fn client_falls_back_to_real_ip_then_socket() {
        let req = Request::builder()
            .header("x-real-ip", "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&req), "198.51.100.4");

        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_identifier(&req), "192.0.2.1");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&req), "unknown");
    }

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(30)), 30);
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
    }

    #[tokio::test]
    async fn allowed_responses_report_remaining() {
        let app = router(Arc::new(InMemoryRateLimitStore::new()), 3, true);

        let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "3");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "2");
    }

    #[tokio::test]
    async fn blocks_excess_requests_with_retry_after() {
        let app = router(Arc::new(InMemoryRateLimitStore::new()), 2, true);

        for _ in 0..2 {
            let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "120");

        let other = app.oneshot(request_from("2.2.2.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn store_sees_prefixed_client_key() {
        let mut store = store::MockRateLimitStore::new();
        store
            .expect_transition()
            .withf(|key, policy, _| key == "test:203.0.113.7" && policy.max_attempts == 4)
            .times(1)
            .returning(|_, _, _| Decision::Denied {
                retry_after: Duration::from_millis(2500),
            });

        let response = router(Arc::new(store), 4, true)
            .oneshot(request_from("203.0.113.7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "3");
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "4");
    }

    #[tokio::test]
    async fn disabled_layer_passes_everything() {
        let app = router(Arc::new(InMemoryRateLimitStore::new()), 1, false);
        for _ in 0..5 {
            let response = app.clone().oneshot(request_from("1.1.1.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn prefixes_are_independent() {
        let store: Arc<dyn RateLimitStore> = Arc::new(InMemoryRateLimitStore::new());
        let policy = RatePolicy::new(1, Duration::from_secs(60), Duration::from_secs(60));
        let app = Router::new()
            .route(
                "/a",
                post(test_handler).layer(RateLimitLayer::new(Arc::clone(&store), "a", policy)),
            )
            .route(
                "/b",
                post(test_handler).layer(RateLimitLayer::new(store, "b", policy)),
            );

        for uri in ["/a", "/b"] {
            let req = Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
