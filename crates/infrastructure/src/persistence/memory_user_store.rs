//! In-process account store for development and tests
//!
//! Accounts vanish on restart.

use std::collections::HashMap;

use application::{error::ApplicationError, ports::UserStore};
use async_trait::async_trait;
use domain::{EmailAddress, User, UserId};
use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), ApplicationError> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            return Err(ApplicationError::EmailTaken);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, ApplicationError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError> {
        Ok(self.users.read().get(&id).cloned())
    }
}
