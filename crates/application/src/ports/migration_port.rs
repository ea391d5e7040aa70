//! Schema migration port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait MigrationPort: Send + Sync {
    /// Apply pending migrations, returning the names of those applied now
    async fn run_migrations(&self) -> Result<Vec<String>, ApplicationError>;
}
