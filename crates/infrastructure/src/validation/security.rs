//! Security validation for application configuration
//!
//! Validates configuration for security issues and provides warnings at startup.
//! Critical issues in production will prevent startup unless explicitly allowed.

use std::fmt;

use secrecy::ExposeSecret;

use crate::config::AppConfig;

/// Severity level for security warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WarningSeverity {
    /// Informational - no action required
    Info,
    /// Warning - should be addressed but not critical
    Warning,
    /// Critical - must be addressed in production
    Critical,
}

impl fmt::Display for WarningSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A security warning with severity and description
#[derive(Debug, Clone)]
pub struct SecurityWarning {
    /// Severity level of the warning
    pub severity: WarningSeverity,
    /// Short code identifying the warning type
    pub code: String,
    /// Human-readable description of the issue
    pub message: String,
    /// Recommended action to resolve the issue
    pub recommendation: String,
}

impl SecurityWarning {
    /// Create a new security warning
    #[must_use]
    pub fn new(
        severity: WarningSeverity,
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            recommendation: recommendation.into(),
        }
    }

    /// Create a critical warning
    #[must_use]
    pub fn critical(
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self::new(WarningSeverity::Critical, code, message, recommendation)
    }

    /// Create a warning-level issue
    #[must_use]
    pub fn warning(
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self::new(WarningSeverity::Warning, code, message, recommendation)
    }

    /// Create an informational notice
    #[must_use]
    pub fn info(
        code: impl Into<String>,
        message: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self::new(WarningSeverity::Info, code, message, recommendation)
    }

    /// Check if this warning is critical
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        matches!(self.severity, WarningSeverity::Critical)
    }
}

impl fmt::Display for SecurityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} - {}",
            self.severity, self.code, self.message, self.recommendation
        )
    }
}

/// Minimum signing-key length for HS256
const MIN_JWT_SECRET_BYTES: usize = 32;

/// Validates application configuration for security issues
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityValidator;

impl SecurityValidator {
    /// Validate configuration and return all security warnings
    ///
    /// Returns a list of warnings sorted by severity (critical first).
    #[must_use]
    pub fn validate(config: &AppConfig) -> Vec<SecurityWarning> {
        let mut warnings = Vec::new();
        let is_production = config.environment.is_production();

        Self::check_jwt_secret(config, is_production, &mut warnings);
        Self::check_allowed_origins(config, is_production, &mut warnings);
        Self::check_migration_secret(config, &mut warnings);
        Self::check_rate_limiting(config, is_production, &mut warnings);
        Self::check_ai_providers(config, &mut warnings);
        Self::check_database(config, is_production, &mut warnings);

        warnings.sort_by(|a, b| b.severity.cmp(&a.severity));
        warnings
    }

    /// Check if startup should be blocked due to critical security issues
    ///
    /// Returns `true` if the server should refuse to start.
    /// `CANVAS_ALLOW_INSECURE_CONFIG=true` overrides the block.
    #[must_use]
    pub fn should_block_startup(config: &AppConfig, warnings: &[SecurityWarning]) -> bool {
        let allow_insecure = std::env::var("CANVAS_ALLOW_INSECURE_CONFIG")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Self::blocks(config, warnings, allow_insecure)
    }

    fn blocks(config: &AppConfig, warnings: &[SecurityWarning], allow_insecure: bool) -> bool {
        let has_critical = warnings.iter().any(SecurityWarning::is_critical);
        config.environment.is_production() && has_critical && !allow_insecure
    }

    /// Log all warnings using tracing
    pub fn log_warnings(warnings: &[SecurityWarning]) {
        for warning in warnings {
            match warning.severity {
                WarningSeverity::Critical => {
                    tracing::error!(
                        code = %warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Security configuration issue"
                    );
                },
                WarningSeverity::Warning => {
                    tracing::warn!(
                        code = %warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Security configuration warning"
                    );
                },
                WarningSeverity::Info => {
                    tracing::info!(
                        code = %warning.code,
                        message = %warning.message,
                        recommendation = %warning.recommendation,
                        "Security configuration notice"
                    );
                },
            }
        }
    }

    fn check_jwt_secret(config: &AppConfig, is_production: bool, warnings: &mut Vec<SecurityWarning>) {
        if config.security.uses_default_jwt_secret() {
            let severity = if is_production {
                WarningSeverity::Critical
            } else {
                WarningSeverity::Warning
            };
            warnings.push(SecurityWarning::new(
                severity,
                "SEC001",
                "Tokens are signed with the built-in development secret",
                "Set JWT_SECRET to a random value of at least 32 bytes",
            ));
            return;
        }

        let short = config
            .security
            .jwt_secret
            .as_ref()
            .is_some_and(|s| s.expose_secret().len() < MIN_JWT_SECRET_BYTES);
        if short {
            warnings.push(SecurityWarning::warning(
                "SEC002",
                "JWT secret is shorter than 32 bytes",
                "Use a longer random JWT_SECRET",
            ));
        }
    }

    fn check_allowed_origins(
        config: &AppConfig,
        is_production: bool,
        warnings: &mut Vec<SecurityWarning>,
    ) {
        if config.server.allowed_origins.is_empty() {
            let severity = if is_production {
                WarningSeverity::Warning
            } else {
                WarningSeverity::Info
            };
            warnings.push(SecurityWarning::new(
                severity,
                "SEC003",
                "No allowed origins configured; localhost and *.vercel.app are accepted",
                "Set ALLOWED_ORIGINS to the deployed frontend origins",
            ));
        }

        if is_production
            && config
                .server
                .public_url
                .as_deref()
                .is_some_and(|url| !url.starts_with("https://"))
        {
            warnings.push(SecurityWarning::warning(
                "SEC004",
                "Public URL is not served over HTTPS",
                "Serve the frontend over HTTPS in production",
            ));
        }
    }

    fn check_migration_secret(config: &AppConfig, warnings: &mut Vec<SecurityWarning>) {
        if config.security.migration_secret.is_none() {
            warnings.push(SecurityWarning::info(
                "SEC005",
                "MIGRATION_SECRET not set; /api/db-migrate is disabled",
                "Set MIGRATION_SECRET to enable remote migrations",
            ));
        }
    }

    fn check_rate_limiting(
        config: &AppConfig,
        is_production: bool,
        warnings: &mut Vec<SecurityWarning>,
    ) {
        if !config.limits.rate_limit_enabled && is_production {
            warnings.push(SecurityWarning::warning(
                "SEC006",
                "Rate limiting is disabled in production",
                "Enable limits.rate_limit_enabled to protect login and AI routes",
            ));
        }
    }

    fn check_ai_providers(config: &AppConfig, warnings: &mut Vec<SecurityWarning>) {
        if !config.ai.groq.is_configured() && !config.ai.openrouter.is_configured() {
            warnings.push(SecurityWarning::warning(
                "SEC007",
                "No AI provider key configured; AI routes will fail",
                "Set GROQ_API_KEY and/or OPENROUTER_API_KEY",
            ));
        }
    }

    fn check_database(config: &AppConfig, is_production: bool, warnings: &mut Vec<SecurityWarning>) {
        if !config.database.is_configured() {
            let severity = if is_production {
                WarningSeverity::Critical
            } else {
                WarningSeverity::Info
            };
            warnings.push(SecurityWarning::new(
                severity,
                "SEC008",
                "DATABASE_URL not set; accounts are kept in memory and lost on restart",
                "Set DATABASE_URL to a Postgres instance",
            ));
        }
    }
}
