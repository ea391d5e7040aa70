//! Origin-based CSRF guard
//!
//! State-changing requests must come from an allow-listed origin, taken from
//! `Origin` or, failing that, the scheme and host of `Referer`. Entries may
//! contain `*` wildcards matching a single DNS label (`https://*.vercel.app`).

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{
        Method,
        header::{ORIGIN, REFERER},
    },
    response::{IntoResponse, Response},
};
use regex::Regex;
use tower::{Layer, Service};
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;

#[derive(Debug, Clone)]
enum OriginPattern {
    Exact(String),
    Wildcard(Regex),
}

impl OriginPattern {
    fn compile(entry: &str) -> Option<Self> {
        let entry = entry.trim().trim_end_matches('/').to_ascii_lowercase();
        if entry.is_empty() {
            return None;
        }
        if !entry.contains('*') {
            return Some(Self::Exact(entry));
        }

        let body = entry
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("[a-z0-9-]+");
        match Regex::new(&format!("^{body}$")) {
            Ok(regex) => Some(Self::Wildcard(regex)),
            Err(e) => {
                warn!(pattern = %entry, error = %e, "Ignoring unparsable origin pattern");
                None
            },
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Exact(allowed) => allowed == origin,
            Self::Wildcard(regex) => regex.is_match(origin),
        }
    }
}

/// Compiled allow-list plus the posture that decides origin-less requests
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    patterns: Vec<OriginPattern>,
    allow_missing_origin: bool,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I, allow_missing_origin: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: origins
                .into_iter()
                .filter_map(|o| OriginPattern::compile(o.as_ref()))
                .collect(),
            allow_missing_origin,
        }
    }

    /// Build from application config; origin-less calls pass only in development
    pub fn from_config(config: &infrastructure::AppConfig) -> Self {
        Self::new(
            config.effective_allowed_origins(),
            !config.environment.is_production(),
        )
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/').to_ascii_lowercase();
        self.patterns.iter().any(|p| p.matches(&origin))
    }

    /// Decide a request. Safe methods are never inspected.
    pub fn check(&self, req: &Request) -> bool {
        if is_safe(req.method()) {
            return true;
        }
        match request_origin(req) {
            Some(origin) => self.is_allowed(&origin),
            None => self.allow_missing_origin,
        }
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// `Origin`, else scheme and host (with port) of `Referer`
pub fn request_origin(req: &Request) -> Option<String> {
    let headers = req.headers();
    if let Some(origin) = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
    {
        return Some(origin.to_string());
    }

    let referer = headers.get(REFERER)?.to_str().ok()?;
    let url = Url::parse(referer).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    })
}

/// Layer that rejects cross-origin state changes with 403
#[derive(Clone, Debug)]
pub struct CsrfLayer {
    policy: Arc<OriginPolicy>,
}

impl CsrfLayer {
    #[must_use]
    pub fn new(policy: OriginPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for CsrfLayer {
    type Service = CsrfGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CsrfGuard {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CsrfGuard<S> {
    inner: S,
    policy: Arc<OriginPolicy>,
}

impl<S> Service<Request> for CsrfGuard<S>
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
        if self.policy.check(&req) {
            debug!(method = %req.method(), "Origin check passed");
            let mut inner = self.inner.clone();
            return Box::pin(async move { inner.call(req).await });
        }

        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            origin = ?request_origin(&req),
            "Rejected request from disallowed origin"
        );
        Box::pin(async { Ok(ApiError::CsrfRejected.into_response()) })
    }
}
