//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP listener, origins, body limits
//! - `ai`: Groq / OpenRouter routes and transcription
//! - `database`: Postgres connection
//! - `security`: token signing and migration secret
//! - `limits`: per-route rate limits and deadlines
//!
//! Sources, lowest precedence first: built-in defaults, optional `config.toml`,
//! `CANVAS_*` variables (nested keys joined with `__`, e.g. `CANVAS_SERVER__PORT`),
//! then the conventional deployment variables (`GROQ_API_KEY`, `DATABASE_URL`, ...).

mod ai;
mod database;
mod limits;
mod security;
mod server;

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use ai::{AiConfig, ProviderSection};
pub use database::DatabaseConfig;
pub use limits::{LimitsConfig, RoutePolicyConfig};
pub use security::{DEVELOPMENT_JWT_SECRET, SecurityConfig};
pub use server::ServerConfig;

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
///
/// Controls security validation strictness, error detail exposure,
/// log format and whether requests without an origin are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - relaxed checks, verbose errors
    #[default]
    Development,
    /// Production environment - strict validation, opaque errors
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

impl AppConfig {
    /// Load configuration from file, `CANVAS_*` variables and deployment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("CANVAS")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply the conventional deployment variables on top of the loaded config
    ///
    /// Blank values are ignored; unparsable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| var(key).map(|v| SecretString::from(v.trim().to_string()));

        if let Some(env) = var("APP_ENV") {
            match env.parse() {
                Ok(env) => self.environment = env,
                Err(e) => warn!(error = %e, "Ignoring APP_ENV"),
            }
        }
        if let Some(port) = var("PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %port, error = %e, "Ignoring invalid PORT"),
            }
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(url) = var("PUBLIC_URL") {
            self.server.public_url = Some(url.trim().to_string());
        }
        if let Some(key) = secret("GROQ_API_KEY") {
            self.ai.groq.api_key = Some(key);
        }
        if let Some(key) = secret("OPENROUTER_API_KEY") {
            self.ai.openrouter.api_key = Some(key);
        }
        if let Some(url) = secret("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(jwt) = secret("JWT_SECRET") {
            self.security.jwt_secret = Some(jwt);
        }
        if let Some(migration) = secret("MIGRATION_SECRET") {
            self.security.migration_secret = Some(migration);
        }
    }

    /// Origins accepted by the CSRF guard
    ///
    /// The configured list, or local dev servers plus Vercel previews, plus
    /// the public URL when set.
    #[must_use]
    pub fn effective_allowed_origins(&self) -> Vec<String> {
        let mut origins = if self.server.allowed_origins.is_empty() {
            vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "https://*.vercel.app".to_string(),
            ]
        } else {
            self.server.allowed_origins.clone()
        };
        if let Some(public) = &self.server.public_url {
            let public = public.trim_end_matches('/').to_string();
            if !origins.contains(&public) {
                origins.push(public);
            }
        }
        origins
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn environment_default_is_development() {
        assert_eq!(Environment::default(), Environment::Development);
        assert!(!Environment::default().is_production());
    }

    #[test]
    fn environment_from_str() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!(
            "Production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn deployment_variables_override_defaults() {
        let config = overrides(&[
            ("APP_ENV", "production"),
            ("PORT", "8080"),
            ("GROQ_API_KEY", "gsk_test"),
            ("DATABASE_URL", "postgres://localhost/canvas"),
            ("JWT_SECRET", "jwt"),
            ("MIGRATION_SECRET", "mig"),
        ]);

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 8080);
        assert_eq!(
            config.ai.groq.api_key.as_ref().map(ExposeSecret::expose_secret),
            Some("gsk_test")
        );
        assert!(config.ai.openrouter.api_key.is_none());
        assert!(config.database.is_configured());
        assert!(config.security.migration_secret.is_some());
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let config = overrides(&[("PORT", "not-a-port"), ("APP_ENV", "staging"), ("JWT_SECRET", "  ")]);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.environment, Environment::Development);
        assert!(config.security.jwt_secret.is_none());
    }

    #[test]
    fn allowed_origins_split_on_commas() {
        let config = overrides(&[(
            "ALLOWED_ORIGINS",
            "https://canvas.example.com, https://*.vercel.app,,",
        )]);
        assert_eq!(
            config.server.allowed_origins,
            vec!["https://canvas.example.com", "https://*.vercel.app"]
        );
    }

    #[test]
    fn default_origins_include_dev_servers_and_public_url() {
        let config = overrides(&[("PUBLIC_URL", "https://canvas.example.com/")]);
        let origins = config.effective_allowed_origins();
        assert!(origins.contains(&"http://localhost:5173".to_string()));
        assert!(origins.contains(&"https://*.vercel.app".to_string()));
        assert!(origins.contains(&"https://canvas.example.com".to_string()));
    }

    #[test]
    fn configured_origins_replace_defaults() {
        let config = overrides(&[("ALLOWED_ORIGINS", "https://only.example.com")]);
        assert_eq!(
            config.effective_allowed_origins(),
            vec!["https://only.example.com"]
        );
    }

    #[test]
    fn empty_document_deserializes_to_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.limits.ai_generate.timeout_secs, 55);
    }
}
