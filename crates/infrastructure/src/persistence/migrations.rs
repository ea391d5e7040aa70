//! Database migrations
//!
//! Migrations are embedded, applied in order and recorded in
//! `schema_migrations`. Every statement is idempotent
//! (`CREATE ... IF NOT EXISTS`), so re-running a partially applied
//! migration is safe.
//!
//! ## Adding New Migrations
//!
//! Append a [`Migration`] to [`MIGRATIONS`]; never edit or reorder
//! existing entries.

use std::collections::HashSet;

use application::{error::ApplicationError, ports::MigrationPort};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use super::error::map_sqlx_error;

/// One named schema change
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// All migrations, oldest first
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_users",
        statements: &[
            r"CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                nome TEXT,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        ],
    },
    Migration {
        name: "002_workflows",
        statements: &[
            r"CREATE TABLE IF NOT EXISTS workflows (
                id TEXT NOT NULL,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                data JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (user_id, id)
            )",
            r"CREATE INDEX IF NOT EXISTS idx_workflows_user ON workflows(user_id)",
        ],
    },
    Migration {
        name: "003_evaluations",
        statements: &[
            r"CREATE TABLE IF NOT EXISTS evaluations (
                workflow_id TEXT NOT NULL,
                user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                automation_potential SMALLINT NOT NULL CHECK (automation_potential BETWEEN 1 AND 5),
                cognitive_load SMALLINT NOT NULL CHECK (cognitive_load BETWEEN 1 AND 5),
                note TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (user_id, workflow_id)
            )",
        ],
    },
];

/// Migrations not yet recorded as applied, in declaration order
pub fn pending<'a>(migrations: &'a [Migration], applied: &HashSet<String>) -> Vec<&'a Migration> {
    migrations
        .iter()
        .filter(|m| !applied.contains(m.name))
        .collect()
}

/// Applies [`MIGRATIONS`] to a Postgres database
#[derive(Debug, Clone)]
pub struct PgMigrator {
    pool: PgPool,
}

impl PgMigrator {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn applied(&self) -> Result<HashSet<String>, ApplicationError> {
        sqlx::query(
            r"CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM schema_migrations")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(names.into_iter().collect())
    }

    async fn apply(&self, migration: &Migration) -> Result<bool, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for statement in migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        let recorded = sqlx::query(
            "INSERT INTO schema_migrations (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        )
        .bind(migration.name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(recorded.rows_affected() == 1)
    }
}

#[async_trait]
impl MigrationPort for PgMigrator {
    #[instrument(skip(self))]
    async fn run_migrations(&self) -> Result<Vec<String>, ApplicationError> {
        let applied = self.applied().await?;
        let todo = pending(MIGRATIONS, &applied);
        if todo.is_empty() {
            debug!("Database schema is up to date");
            return Ok(Vec::new());
        }

        info!(count = todo.len(), "Running database migrations");
        let mut names = Vec::with_capacity(todo.len());
        for migration in todo {
            match self.apply(migration).await {
                Ok(true) => names.push(migration.name.to_string()),
                Ok(false) => debug!(name = migration.name, "Migration applied concurrently"),
                Err(e) => {
                    error!(name = migration.name, error = %e, "Migration failed");
                    return Err(e);
                },
            }
        }

        info!(applied = ?names, "Database migrations complete");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_names_are_unique_and_ordered() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn statements_are_idempotent() {
        for migration in MIGRATIONS {
            for statement in migration.statements {
                assert!(
                    statement.contains("IF NOT EXISTS"),
                    "{} is not idempotent",
                    migration.name
                );
            }
        }
    }

    #[test]
    fn pending_skips_applied_in_order() {
        let applied: HashSet<String> = ["001_users".to_string()].into_iter().collect();
        let names: Vec<&str> = pending(MIGRATIONS, &applied).iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["002_workflows", "003_evaluations"]);
    }

    #[test]
    fn nothing_pending_when_all_applied() {
        let applied: HashSet<String> = MIGRATIONS.iter().map(|m| m.name.to_string()).collect();
        assert!(pending(MIGRATIONS, &applied).is_empty());
    }
}
