//! Registered account

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{EmailAddress, UserId};

/// A stored account with its password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub nome: Option<String>,
    /// PHC-formatted password hash
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The projection of a user that is safe to return to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
}

impl User {
    pub fn new(email: EmailAddress, nome: Option<String>, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email,
            nome: nome.filter(|n| !n.trim().is_empty()),
            password_hash,
            created_at: Utc::now(),
        }
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            nome: self.nome.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(
            EmailAddress::new("a@b.com").unwrap(),
            Some("Anna".to_string()),
            "$argon2id$v=19$...".to_string(),
        )
    }

    #[test]
    fn public_projection_omits_hash() {
        let json = serde_json::to_value(sample().public()).unwrap();
        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["nome"], "Anna");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }

    #[test]
    fn blank_name_is_dropped() {
        let user = User::new(
            EmailAddress::new("a@b.com").unwrap(),
            Some("   ".to_string()),
            String::new(),
        );
        assert!(user.nome.is_none());
    }
}
