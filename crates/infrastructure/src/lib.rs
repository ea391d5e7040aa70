//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: hosted LLM and
//! transcription providers, password hashing, token signing, Postgres
//! persistence. Also owns configuration loading, tracing setup and the
//! startup security checks.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;
pub mod validation;

pub use adapters::*;
pub use config::{
    AiConfig, AppConfig, DatabaseConfig, Environment, LimitsConfig, RoutePolicyConfig,
    SecurityConfig, ServerConfig,
};
pub use persistence::{
    InMemoryUserStore, PgDatabaseHealth, PgMigrator, PgUserStore, UnconfiguredDatabase,
    create_pool,
};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
pub use validation::{SecurityValidator, SecurityWarning, WarningSeverity};
