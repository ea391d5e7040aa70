//! Postgres database health adapter

use std::time::Instant;

use application::{
    error::ApplicationError,
    ports::{DatabaseHealth, DatabaseHealthPort},
};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct PgDatabaseHealth {
    pool: PgPool,
}

impl PgDatabaseHealth {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `PostgreSQL 16.2 on x86_64-pc-linux-gnu, ...` → `PostgreSQL 16.2`
fn short_version(full: &str) -> String {
    full.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl DatabaseHealthPort for PgDatabaseHealth {
    #[instrument(skip(self))]
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError> {
        let start = Instant::now();

        match sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
        {
            Ok(version) => {
                // SAFETY: bounded by the pool acquire timeout
                #[allow(clippy::cast_possible_truncation)]
                let response_time_ms = start.elapsed().as_millis() as u64;
                debug!(version = %version, response_time_ms, "Database health check passed");
                Ok(DatabaseHealth::reachable(Some(short_version(&version)))
                    .with_response_time(response_time_ms))
            },
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                Ok(DatabaseHealth::unreachable())
            },
        }
    }
}

/// Health probe used when no database is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredDatabase;

#[async_trait]
impl DatabaseHealthPort for UnconfiguredDatabase {
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError> {
        Err(ApplicationError::Configuration(
            "DATABASE_URL not set".to_string(),
        ))
    }
}
