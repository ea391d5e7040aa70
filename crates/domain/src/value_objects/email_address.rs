//! Account email address
//!
//! ```
//! use domain::EmailAddress;
//!
//! let email = EmailAddress::new("  Mario.Rossi@Example.IT ").unwrap();
//! assert_eq!(email.as_str(), "mario.rossi@example.it");
//! assert!(EmailAddress::new("mario").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// A validated, lower-cased email address used as the account login
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress {
    #[validate(email, length(max = 254))]
    value: String,
}

impl EmailAddress {
    /// Normalise (trim, lower-case) and validate an email address
    pub fn new(email: impl Into<String>) -> Result<Self, DomainError> {
        let candidate = Self {
            value: email.into().trim().to_lowercase(),
        };
        candidate
            .validate()
            .map_err(|e| DomainError::InvalidEmailAddress(e.to_string()))?;
        Ok(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Domain part, used in logs instead of the full address
    pub fn domain(&self) -> &str {
        self.value.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.value
    }
}
