//! Password hashing using Argon2id
//!
//! # Examples
//!
//! ```
//! use application::ports::PasswordHasherPort;
//! use infrastructure::adapters::Argon2PasswordHasher;
//!
//! let hasher = Argon2PasswordHasher::new();
//! let hash = hasher.hash("Abcdef1!").unwrap();
//!
//! assert!(hash.starts_with("$argon2id$"));
//! assert!(hasher.verify("Abcdef1!", &hash));
//! assert!(!hasher.verify("wrong", &hash));
//! ```

use application::{error::ApplicationError, ports::PasswordHasherPort};
use argon2::{
    Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{debug, instrument, warn};

/// Argon2id hasher with the crate's default parameters
/// (19 MiB memory, 2 iterations, 1 lane)
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether a stored value looks like a PHC-formatted Argon2 hash
    #[must_use]
    pub fn is_hashed(value: &str) -> bool {
        value.starts_with("$argon2")
    }
}

impl PasswordHasherPort for Argon2PasswordHasher {
    #[instrument(skip(self, password))]
    fn hash(&self, password: &str) -> Result<String, ApplicationError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApplicationError::Internal(format!("Failed to hash password: {e}")))?;

        debug!("Password hashed");
        Ok(hash.to_string())
    }

    #[instrument(skip(self, password, hash))]
    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is not in PHC format");
                return false;
            },
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
