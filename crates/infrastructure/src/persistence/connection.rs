//! Postgres connection pool

use std::time::Duration;

use application::error::ApplicationError;
use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument};

use crate::config::DatabaseConfig;

/// Build a lazily-connecting pool
///
/// No connection is opened until the first query, so the server starts even
/// while the database is unreachable; `/api/db-check` reports the outage.
#[instrument(skip_all, fields(max_connections = config.max_connections))]
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool, ApplicationError> {
    let url = config
        .url
        .as_ref()
        .ok_or_else(|| ApplicationError::Configuration("DATABASE_URL not set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_lazy(url.expose_secret())
        .map_err(|e| ApplicationError::Configuration(format!("Invalid DATABASE_URL: {e}")))?;

    info!("Postgres pool created");
    Ok(pool)
}
