//! Postgres-backed account store

use application::{error::ApplicationError, ports::UserStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{EmailAddress, User, UserId};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::error::{is_unique_violation, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    nome: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = ApplicationError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(row.email)
            .map_err(|e| ApplicationError::Database(format!("Stored email is invalid: {e}")))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            email,
            nome: row.nome,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: &User) -> Result<(), ApplicationError> {
        sqlx::query(
            r"
            INSERT INTO users (id, email, nome, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user.id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.nome)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApplicationError::EmailTaken
            } else {
                map_sqlx_error(e)
            }
        })?;

        debug!("User inserted");
        Ok(())
    }

    #[instrument(skip(self, email), fields(domain = email.domain()))]
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, ApplicationError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, email, nome, password_hash, created_at
            FROM users WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT id, email, nome, password_hash, created_at
            FROM users WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(User::try_from).transpose()
    }
}
