//! AI Collaboration Canvas HTTP presentation layer
//!
//! Axum router, per-route middleware chains and handlers for the canvas API.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, set_expose_internal_errors};
pub use middleware::{
    CsrfLayer, HeaderPolicyLayer, RateLimitLayer, TimeoutLayer, ValidatedJson, ValidationLayer,
    spawn_cleanup_task,
};
pub use routes::create_router;
pub use server::{ShutdownOutcome, serve_with_drain_deadline};
pub use state::{Adapters, AppState};
