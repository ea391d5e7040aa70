//! Response header policy
//!
//! Applies a cache strategy, the security header bundle and the content
//! security policy to every response of the routes it wraps.
//!
//! Headers added by the security bundle:
//! - `X-Content-Type-Options: nosniff`
//! - `X-Frame-Options: DENY`
//! - `X-XSS-Protection: 1; mode=block`
//! - `Referrer-Policy: strict-origin-when-cross-origin`
//! - `Permissions-Policy`
//!
//! # Example
//!
//! ```ignore
//! use presentation_http::middleware::{CacheStrategy, HeaderPolicy, HeaderPolicyLayer};
//!
//! let app = Router::new()
//!     .route("/api/health", get(handler))
//!     .layer(HeaderPolicyLayer::new(HeaderPolicy::api().with_cache(CacheStrategy::Short)));
//! ```

use std::{
    future::Future,
    pin::Pin,
    str::FromStr,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CACHE_CONTROL, CONTENT_SECURITY_POLICY, CONTENT_TYPE, EXPIRES, PRAGMA},
    },
    response::Response,
};
use tower::{Layer, Service};
use tracing::warn;

/// Content security policy for the canvas: own origin plus AI providers and
/// hosted Postgres endpoints
pub const CONTENT_SECURITY_POLICY_VALUE: &str = "default-src 'self'; \
     script-src 'self'; \
     style-src 'self' 'unsafe-inline'; \
     img-src 'self' data: blob:; \
     media-src 'self' blob:; \
     connect-src 'self' https://api.groq.com https://openrouter.ai https://*.supabase.co https://*.neon.tech; \
     frame-ancestors 'none'; \
     base-uri 'self'; \
     form-action 'self'";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    #[default]
    NoCache,
    Short,
    Medium,
    Long,
    /// Versioned assets that never change
    Immutable,
}

impl CacheStrategy {
    pub const fn directive(self) -> &'static str {
        match self {
            Self::NoCache => "no-store, no-cache, must-revalidate, proxy-revalidate",
            Self::Short => "public, max-age=60, s-maxage=60, stale-while-revalidate=30",
            Self::Medium => "public, max-age=300, s-maxage=300, stale-while-revalidate=60",
            Self::Long => "public, max-age=3600, s-maxage=3600, stale-while-revalidate=300",
            Self::Immutable => "public, max-age=31536000, immutable",
        }
    }

    /// Lenient parse for configuration values; unknown names mean no-cache
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|()| {
            warn!(strategy = %name, "Unknown cache strategy, using no-cache");
            Self::NoCache
        })
    }
}

impl FromStr for CacheStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no-cache" | "nocache" | "none" => Ok(Self::NoCache),
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            "immutable" => Ok(Self::Immutable),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPolicy {
    pub cache: CacheStrategy,
    pub security: bool,
    pub csp: bool,
    /// Label bodies as JSON when the handler did not set a type
    pub json_content_type: bool,
}

impl HeaderPolicy {
    /// Everything on, responses not cached
    pub const fn api() -> Self {
        Self {
            cache: CacheStrategy::NoCache,
            security: true,
            csp: true,
            json_content_type: true,
        }
    }

    #[must_use]
    pub const fn with_cache(mut self, cache: CacheStrategy) -> Self {
        self.cache = cache;
        self
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(self.cache.directive()));
        if self.cache == CacheStrategy::NoCache {
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            headers.insert(EXPIRES, HeaderValue::from_static("0"));
        } else {
            headers.remove(PRAGMA);
            headers.remove(EXPIRES);
        }

        if self.security {
            for (name, value) in [
                ("x-content-type-options", "nosniff"),
                ("x-frame-options", "DENY"),
                ("x-xss-protection", "1; mode=block"),
                ("referrer-policy", "strict-origin-when-cross-origin"),
                (
                    "permissions-policy",
                    "accelerometer=(), camera=(), geolocation=(), gyroscope=(), \
                     magnetometer=(), microphone=(self), payment=(), usb=()",
                ),
            ] {
                headers.insert(
                    HeaderName::from_static(name),
                    HeaderValue::from_static(value),
                );
            }
        }

        if self.csp {
            headers.insert(
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(CONTENT_SECURITY_POLICY_VALUE),
            );
        }

        if self.json_content_type && !headers.contains_key(CONTENT_TYPE) {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
        }
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::api()
    }
}

#[derive(Clone, Debug, Default)]
pub struct HeaderPolicyLayer {
    policy: HeaderPolicy,
}

impl HeaderPolicyLayer {
    #[must_use]
    pub const fn new(policy: HeaderPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for HeaderPolicyLayer {
    type Service = HeaderPolicyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeaderPolicyService {
            inner,
            policy: self.policy,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeaderPolicyService<S> {
    inner: S,
    policy: HeaderPolicy,
}

impl<S> Service<Request> for HeaderPolicyService<S>
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
        let policy = self.policy;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            policy.apply(response.headers_mut());
            Ok(response)
        })
    }
}
