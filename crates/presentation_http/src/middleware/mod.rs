//! HTTP middleware components
//!
//! Per-route chains are composed in `routes` in the order header policy,
//! CSRF guard, validation, rate limit, timeout. Request ids and tracing wrap
//! the whole router.

pub mod auth;
pub mod csrf;
pub mod header_policy;
pub mod rate_limit;
pub mod request_id;
pub mod timeout;
pub mod validation;

pub use auth::{AuthenticatedUser, BearerToken};
pub use csrf::{CsrfLayer, OriginPolicy};
pub use header_policy::{CacheStrategy, HeaderPolicy, HeaderPolicyLayer};
pub use rate_limit::{
    InMemoryRateLimitStore, RateLimitLayer, RateLimitStore, RatePolicy, client_identifier,
    spawn_cleanup_task,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
pub use timeout::{ResponseCommit, TimeoutLayer};
pub use validation::{
    FieldRule, ItemKind, ValidatedJson, ValidationLayer, ValidationSchema, Violation,
};
