//! Account persistence port

use async_trait::async_trait;
use domain::{EmailAddress, User, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account
    ///
    /// Returns [`ApplicationError::EmailTaken`] when the email is already used.
    async fn insert(&self, user: &User) -> Result<(), ApplicationError>;

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, ApplicationError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError>;
}
