//! Plain-text password accepted at registration
//!
//! The value only lives for the duration of a request: it is hashed by the
//! credential hasher and never stored or logged.

use std::fmt;

use crate::errors::DomainError;

/// Minimum number of characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum number of characters accepted before hashing
pub const MAX_PASSWORD_LEN: usize = 128;

/// A password that satisfies the strength policy: at least eight characters
/// with an upper-case letter, a lower-case letter, a digit and a symbol.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        let len = raw.chars().count();

        if len < MIN_PASSWORD_LEN {
            return Err(DomainError::WeakPassword(format!(
                "must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if len > MAX_PASSWORD_LEN {
            return Err(DomainError::WeakPassword(format!(
                "must be at most {MAX_PASSWORD_LEN} characters"
            )));
        }

        let missing: Vec<&str> = [
            (raw.chars().any(char::is_uppercase), "an upper-case letter"),
            (raw.chars().any(char::is_lowercase), "a lower-case letter"),
            (raw.chars().any(|c| c.is_ascii_digit()), "a digit"),
            (
                raw.chars()
                    .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
                "a symbol",
            ),
        ]
        .into_iter()
        .filter_map(|(present, label)| (!present).then_some(label))
        .collect();

        if !missing.is_empty() {
            return Err(DomainError::WeakPassword(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        Ok(Self(raw))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_is_accepted() {
        let password = Password::new("Abcdef1!").unwrap();
        assert_eq!(password.expose(), "Abcdef1!");
    }

    #[test]
    fn short_password_is_rejected() {
        let err = Password::new("Ab1!").unwrap_err();
        assert!(err.to_string().contains("at least 8"));
    }

    #[test]
    fn each_missing_class_is_reported() {
        let err = Password::new("abcdefgh").unwrap_err().to_string();
        assert!(err.contains("upper-case"));
        assert!(err.contains("digit"));
        assert!(err.contains("symbol"));
        assert!(!err.contains("lower-case"));
    }

    #[test]
    fn overlong_password_is_rejected() {
        let raw = format!("Aa1!{}", "x".repeat(MAX_PASSWORD_LEN));
        assert!(Password::new(raw).is_err());
    }

    #[test]
    fn debug_does_not_leak() {
        let password = Password::new("Segreto#2024").unwrap();
        assert_eq!(format!("{password:?}"), "Password(***)");
    }
}
