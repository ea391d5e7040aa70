//! Password hashing and token issuance ports

use chrono::{DateTime, Utc};
use domain::{User, UserId};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Hashes and verifies passwords
#[cfg_attr(test, automock)]
pub trait PasswordHasherPort: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, ApplicationError>;

    /// Constant-time verification against a stored hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// A signed bearer token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies bearer tokens
#[cfg_attr(test, automock)]
pub trait TokenIssuerPort: Send + Sync {
    fn issue(&self, user: &User) -> Result<IssuedToken, ApplicationError>;

    fn verify(&self, token: &str) -> Result<TokenClaims, ApplicationError>;
}
