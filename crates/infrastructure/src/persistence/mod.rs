//! Persistence module
//!
//! Postgres storage for accounts and the canvas schema, plus an in-memory
//! account store used without a database.

mod connection;
mod database_health;
mod error;
mod memory_user_store;
pub mod migrations;
mod pg_user_store;

pub use connection::create_pool;
pub use database_health::{PgDatabaseHealth, UnconfiguredDatabase};
pub use error::map_sqlx_error;
pub use memory_user_store::InMemoryUserStore;
pub use migrations::{MIGRATIONS, Migration, PgMigrator};
pub use pg_user_store::PgUserStore;
