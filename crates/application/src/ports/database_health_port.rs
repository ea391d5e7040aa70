//! Database connectivity port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::ApplicationError;

/// Result of a database round-trip probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub reachable: bool,
    /// Server version string reported by the database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl DatabaseHealth {
    #[must_use]
    pub fn reachable(version: Option<String>) -> Self {
        Self {
            reachable: true,
            version,
            response_time_ms: None,
        }
    }

    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            reachable: false,
            version: None,
            response_time_ms: None,
        }
    }

    #[must_use]
    pub const fn with_response_time(mut self, ms: u64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }
}

/// Port for probing the database without coupling to a driver
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatabaseHealthPort: Send + Sync {
    /// Run a lightweight query (`SELECT version()`) and time it
    async fn check_health(&self) -> Result<DatabaseHealth, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn DatabaseHealthPort>();
    }

    #[test]
    fn reachable_serializes_camel_case() {
        let health = DatabaseHealth::reachable(Some("PostgreSQL 16.2".to_string()))
            .with_response_time(12);
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["reachable"], true);
        assert_eq!(json["version"], "PostgreSQL 16.2");
        assert_eq!(json["responseTimeMs"], 12);
    }

    #[test]
    fn unreachable_omits_optional_fields() {
        let json = serde_json::to_value(DatabaseHealth::unreachable()).unwrap();
        assert_eq!(json, serde_json::json!({"reachable": false}));
    }
}
