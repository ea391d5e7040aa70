//! Health and database probes

use application::DatabaseHealth;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub environment: String,
    pub services: ConfiguredServices,
}

/// Which backing services have credentials configured
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfiguredServices {
    pub groq: bool,
    pub openrouter: bool,
    pub database: bool,
}

/// Liveness check; reports configuration, not reachability
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = &state.config;
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        environment: config.environment.to_string(),
        services: ConfiguredServices {
            groq: config.ai.groq.is_configured(),
            openrouter: config.ai.openrouter.is_configured(),
            database: config.database.is_configured(),
        },
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseCheckResponse {
    pub status: &'static str,
    pub database: DatabaseHealth,
}

/// Round-trip to the database; 503 when it cannot be reached
pub async fn db_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<DatabaseCheckResponse>), ApiError> {
    let health = state.database.check_health().await.map_err(|e| {
        warn!(error = %e, "Database check failed");
        ApiError::ServiceUnavailable(e.to_string())
    })?;

    let (status, label) = if health.reachable {
        (StatusCode::OK, "ok")
    } else {
        warn!("Database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };

    Ok((
        status,
        Json(DatabaseCheckResponse {
            status: label,
            database: health,
        }),
    ))
}
