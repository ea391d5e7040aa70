//! Provider configuration

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Hosted LLM providers speaking the OpenAI chat-completions dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Groq,
    OpenRouter,
}

impl Provider {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenRouter => "openrouter",
        }
    }

    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }
}

/// Connection settings for one provider/model pair
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Sent as `HTTP-Referer`; OpenRouter uses it for attribution
    pub referer: Option<String>,
    /// Sent as `X-Title`
    pub app_title: Option<String>,
}

const DEFAULT_TIMEOUT_MS: u64 = 45_000;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.3;

impl ProviderConfig {
    pub fn new(provider: Provider, api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            api_key,
            model: model.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            referer: None,
            app_title: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_attribution(mut self, referer: Option<String>, app_title: Option<String>) -> Self {
        self.referer = referer;
        self.app_title = app_title;
        self
    }

    /// Label used in logs and fallback reports, e.g. `groq/llama-3.3-70b-versatile`
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider.name(), self.model)
    }
}

/// Settings for the Whisper-compatible transcription endpoint
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    /// ISO-639-1 language hint
    pub language: String,
    pub timeout_ms: u64,
}

impl TranscriptionConfig {
    pub fn groq(api_key: SecretString) -> Self {
        Self {
            base_url: Provider::Groq.default_base_url().to_string(),
            api_key,
            model: "whisper-large-v3".to_string(),
            language: "it".to_string(),
            timeout_ms: 60_000,
        }
    }
}
