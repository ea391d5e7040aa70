//! Shared error mapping for the sqlx persistence layer

use application::error::ApplicationError;

/// Postgres SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error to an application-layer error
pub fn map_sqlx_error(e: sqlx::Error) -> ApplicationError {
    match e {
        sqlx::Error::PoolTimedOut => {
            ApplicationError::Database("timed out waiting for a connection".to_string())
        },
        sqlx::Error::Database(db_err) => ApplicationError::Database(db_err.to_string()),
        other => ApplicationError::Database(other.to_string()),
    }
}

/// Whether the error is a unique-constraint violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}
