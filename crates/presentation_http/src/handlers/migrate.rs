//! Schema migration trigger
//!
//! Guarded by the `X-Migration-Secret` header, compared in constant time.

use axum::{Json, extract::State, http::HeaderMap};
use secrecy::ExposeSecret;
use serde::Serialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::{error::ApiError, middleware::ResponseCommit, state::AppState};

pub const MIGRATION_SECRET_HEADER: &str = "x-migration-secret";

#[derive(Debug, Serialize)]
pub struct MigrationResponse {
    pub success: bool,
    pub applied: Vec<String>,
}

fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

pub async fn db_migrate(
    State(state): State<AppState>,
    commit: ResponseCommit,
    headers: HeaderMap,
) -> Result<Json<MigrationResponse>, ApiError> {
    let Some(expected) = state.config.security.migration_secret.as_ref() else {
        warn!("Migration requested but no migration secret is configured");
        return Err(ApiError::ServiceUnavailable(
            "migration secret not configured".to_string(),
        ));
    };

    let provided = headers
        .get(MIGRATION_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided.is_empty() || !secrets_match(provided, expected.expose_secret()) {
        warn!("Migration rejected: bad secret");
        return Err(ApiError::Unauthorized("Segreto di migrazione non valido".to_string()));
    }

    let Some(migrator) = state.migrator.as_ref() else {
        return Err(ApiError::ServiceUnavailable("database not configured".to_string()));
    };

    let applied = migrator.run_migrations().await?;
    commit.mark();
    info!(applied = ?applied, "Migrations run");

    Ok(Json(MigrationResponse {
        success: true,
        applied,
    }))
}
