//! Per-route rate-limit and timeout policies.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Rate-limit and deadline settings for one route family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePolicyConfig {
    /// Requests allowed inside one window
    pub max_attempts: u32,
    pub window_secs: u64,
    /// Lockout after the limit is exceeded
    pub block_secs: u64,
    /// Handler deadline
    pub timeout_secs: u64,
}

impl RoutePolicyConfig {
    const fn new(max_attempts: u32, window_secs: u64, block_secs: u64, timeout_secs: u64) -> Self {
        Self {
            max_attempts,
            window_secs,
            block_secs,
            timeout_secs,
        }
    }
}

/// Route-family policies plus limiter housekeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Global switch for the per-route rate limiter
    #[serde(default = "default_true")]
    pub rate_limit_enabled: bool,

    /// BPMN and VBA generation
    #[serde(default = "default_ai_generate")]
    pub ai_generate: RoutePolicyConfig,

    #[serde(default = "default_ai_chat")]
    pub ai_chat: RoutePolicyConfig,

    #[serde(default = "default_ai_suggestions")]
    pub ai_suggestions: RoutePolicyConfig,

    #[serde(default = "default_process_audio")]
    pub process_audio: RoutePolicyConfig,

    #[serde(default = "default_login")]
    pub login: RoutePolicyConfig,

    #[serde(default = "default_register")]
    pub register: RoutePolicyConfig,

    #[serde(default = "default_db_migrate")]
    pub db_migrate: RoutePolicyConfig,

    /// Deadline for routes without a rate limit (health, db-check, me)
    #[serde(default = "default_timeout")]
    pub default_timeout_secs: u64,

    /// How often idle limiter entries are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Idle time after which a limiter entry is removed
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
}

const fn default_ai_generate() -> RoutePolicyConfig {
    RoutePolicyConfig::new(10, 60, 300, 55)
}

const fn default_ai_chat() -> RoutePolicyConfig {
    RoutePolicyConfig::new(30, 60, 120, 30)
}

const fn default_ai_suggestions() -> RoutePolicyConfig {
    RoutePolicyConfig::new(10, 60, 300, 45)
}

const fn default_process_audio() -> RoutePolicyConfig {
    RoutePolicyConfig::new(5, 600, 600, 60)
}

const fn default_login() -> RoutePolicyConfig {
    RoutePolicyConfig::new(5, 900, 900, 10)
}

const fn default_register() -> RoutePolicyConfig {
    RoutePolicyConfig::new(5, 3600, 3600, 10)
}

const fn default_db_migrate() -> RoutePolicyConfig {
    RoutePolicyConfig::new(3, 3600, 3600, 30)
}

const fn default_timeout() -> u64 {
    10
}

const fn default_sweep_interval() -> u64 {
    300
}

const fn default_retention() -> u64 {
    3600
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_enabled: true,
            ai_generate: default_ai_generate(),
            ai_chat: default_ai_chat(),
            ai_suggestions: default_ai_suggestions(),
            process_audio: default_process_audio(),
            login: default_login(),
            register: default_register(),
            db_migrate: default_db_migrate(),
            default_timeout_secs: default_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            retention_secs: default_retention(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_allows_five_per_quarter_hour() {
        let login = LimitsConfig::default().login;
        assert_eq!(login.max_attempts, 5);
        assert_eq!(login.window_secs, 15 * 60);
        assert_eq!(login.block_secs, 15 * 60);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let limits: LimitsConfig = serde_json::from_value(serde_json::json!({
            "ai_chat": {"max_attempts": 60, "window_secs": 60, "block_secs": 60, "timeout_secs": 20}
        }))
        .unwrap();
        assert_eq!(limits.ai_chat.max_attempts, 60);
        assert_eq!(limits.register, default_register());
        assert!(limits.rate_limit_enabled);
    }
}
