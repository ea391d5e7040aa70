//! Route definitions
//!
//! Every API route gets its own middleware chain. Requests pass through it
//! in this order: header policy, CSRF guard, validation, rate limit,
//! timeout, handler.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
    },
    routing::{MethodRouter, get, post},
};
use infrastructure::{AppConfig, RoutePolicyConfig};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{self, migrate::MIGRATION_SECRET_HEADER},
    middleware::{
        CacheStrategy, CsrfLayer, HeaderPolicy, HeaderPolicyLayer, OriginPolicy, REQUEST_ID_HEADER,
        RateLimitLayer, RateLimitStore, RequestIdLayer, TimeoutLayer, ValidationLayer,
        ValidationSchema,
    },
    state::AppState,
};

/// Shared pieces every guarded route is assembled from
struct Guards {
    origins: OriginPolicy,
    store: Arc<dyn RateLimitStore>,
    rate_limit_enabled: bool,
    json_limit: usize,
    default_timeout: u64,
}

/// What a single route needs on top of the shared guards
#[derive(Default)]
struct RouteGuard {
    schema: Option<ValidationSchema>,
    body_limit: Option<usize>,
    rate_limit: Option<(&'static str, RoutePolicyConfig)>,
    timeout_secs: Option<u64>,
    cache: CacheStrategy,
}

impl RouteGuard {
    fn validate(mut self, schema: ValidationSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    const fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    /// Rate limit under `prefix`; the policy's timeout becomes the deadline
    fn limited(mut self, prefix: &'static str, policy: &RoutePolicyConfig) -> Self {
        self.timeout_secs = Some(policy.timeout_secs);
        self.rate_limit = Some((prefix, *policy));
        self
    }

    const fn cache(mut self, cache: CacheStrategy) -> Self {
        self.cache = cache;
        self
    }
}

impl Guards {
    fn new(state: &AppState) -> Self {
        let config = &state.config;
        Self {
            origins: OriginPolicy::from_config(config),
            store: Arc::clone(&state.rate_limits),
            rate_limit_enabled: config.limits.rate_limit_enabled,
            json_limit: config.server.max_body_size_json_bytes,
            default_timeout: config.limits.default_timeout_secs,
        }
    }

    /// Wrap `route` in its chain; `route_layer` keeps the guards off the
    /// method fallback so a wrong method is not rate limited
    fn wrap(&self, route: MethodRouter<AppState>, guard: RouteGuard) -> MethodRouter<AppState> {
        let timeout = guard.timeout_secs.unwrap_or(self.default_timeout);
        let mut route = route.route_layer(TimeoutLayer::from_secs(timeout));

        if let Some((prefix, policy)) = &guard.rate_limit {
            route = route.route_layer(
                RateLimitLayer::new(Arc::clone(&self.store), prefix, policy.into())
                    .enabled(self.rate_limit_enabled),
            );
        }

        if let Some(schema) = guard.schema {
            let limit = guard.body_limit.unwrap_or(self.json_limit);
            route = route
                .route_layer(ValidationLayer::new(schema, limit))
                .route_layer(DefaultBodyLimit::max(limit));
        }

        route
            .route_layer(CsrfLayer::new(self.origins.clone()))
            .layer(HeaderPolicyLayer::new(
                HeaderPolicy::api().with_cache(guard.cache),
            ))
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let guards = Guards::new(&state);
    let limits = &state.config.limits;
    let audio_limit = state.config.server.max_body_size_audio_bytes;
    let api_headers = HeaderPolicyLayer::new(HeaderPolicy::api());

    Router::new()
        // AI generation
        .route(
            "/api/ai-generate-bpmn",
            guards.wrap(
                post(handlers::ai::generate_bpmn),
                RouteGuard::default()
                    .validate(handlers::ai::schema())
                    .limited("ai-generate", &limits.ai_generate),
            ),
        )
        .route(
            "/api/ai-generate-vba",
            guards.wrap(
                post(handlers::ai::generate_vba),
                RouteGuard::default()
                    .validate(handlers::ai::schema())
                    .limited("ai-generate", &limits.ai_generate),
            ),
        )
        .route(
            "/api/ai-chat",
            guards.wrap(
                post(handlers::chat::chat),
                RouteGuard::default()
                    .validate(handlers::chat::schema())
                    .limited("ai-chat", &limits.ai_chat),
            ),
        )
        .route(
            "/api/ai-suggestions",
            guards.wrap(
                post(handlers::suggestions::suggestions),
                RouteGuard::default()
                    .validate(handlers::suggestions::schema())
                    .limited("ai-suggestions", &limits.ai_suggestions),
            ),
        )
        .route(
            "/api/process-audio",
            guards.wrap(
                post(handlers::audio::process_audio),
                RouteGuard::default()
                    .validate(handlers::audio::schema())
                    .body_limit(audio_limit)
                    .limited("process-audio", &limits.process_audio),
            ),
        )
        // Accounts
        .route(
            "/api/auth/register",
            guards.wrap(
                post(handlers::auth::register),
                RouteGuard::default()
                    .validate(handlers::auth::register_schema())
                    .limited("register", &limits.register),
            ),
        )
        .route(
            "/api/auth/login",
            guards.wrap(
                post(handlers::auth::login),
                RouteGuard::default()
                    .validate(handlers::auth::login_schema())
                    .limited("login", &limits.login),
            ),
        )
        .route(
            "/api/auth/me",
            guards.wrap(get(handlers::auth::me), RouteGuard::default()),
        )
        // Operations
        .route(
            "/api/health",
            guards.wrap(
                get(handlers::health::health_check),
                RouteGuard::default().cache(CacheStrategy::Short),
            ),
        )
        .route(
            "/api/db-check",
            guards.wrap(get(handlers::health::db_check), RouteGuard::default()),
        )
        .route(
            "/api/db-migrate",
            guards.wrap(
                post(handlers::migrate::db_migrate),
                RouteGuard::default().limited("db-migrate", &limits.db_migrate),
            ),
        )
        .method_not_allowed_fallback(
            handlers::fallback::method_not_allowed.layer(api_headers.clone()),
        )
        .fallback(handlers::fallback::not_found.layer(api_headers))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .layer(RequestIdLayer::new())
        .with_state(state)
}

/// CORS for browsers; accepts the same origins as the CSRF guard
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = OriginPolicy::from_config(config);
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(|o| origins.is_allowed(o))
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(MIGRATION_SECRET_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([
            RETRY_AFTER,
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(Duration::from_secs(86_400))
}
