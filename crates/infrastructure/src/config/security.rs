//! Security configuration: token signing and the migration secret.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Signing key used when none is configured (development only)
pub const DEVELOPMENT_JWT_SECRET: &str = "canvas-development-secret-change-me";

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret for bearer tokens
    #[serde(default, skip_serializing)]
    pub jwt_secret: Option<SecretString>,

    /// Token lifetime in hours (default: 7 days)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,

    /// `iss` claim written into and required from every token
    #[serde(default = "default_issuer")]
    pub token_issuer: String,

    /// Secret expected in `X-Migration-Secret`; migrations are disabled without it
    #[serde(default, skip_serializing)]
    pub migration_secret: Option<SecretString>,
}

const fn default_token_ttl() -> i64 {
    24 * 7
}

fn default_issuer() -> String {
    "ai-collaboration-canvas".to_string()
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: default_token_ttl(),
            token_issuer: default_issuer(),
            migration_secret: None,
        }
    }
}

impl SecurityConfig {
    /// Configured signing secret, or the development fallback
    #[must_use]
    pub fn jwt_secret_or_default(&self) -> SecretString {
        self.jwt_secret
            .clone()
            .unwrap_or_else(|| SecretString::from(DEVELOPMENT_JWT_SECRET))
    }

    /// Whether tokens are signed with the well-known development key
    #[must_use]
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret
            .as_ref()
            .is_none_or(|s| s.expose_secret() == DEVELOPMENT_JWT_SECRET)
    }
}
