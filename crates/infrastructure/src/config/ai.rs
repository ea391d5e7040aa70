//! AI provider configuration: Groq, OpenRouter and transcription.

use ai_core::{Provider, ProviderConfig, TranscriptionConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// One hosted provider and the models tried on it, in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Provider API key; the provider is skipped without one
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Override for the provider's base URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub models: Vec<String>,
}

impl ProviderSection {
    fn with_models(models: &[&str]) -> Self {
        Self {
            api_key: None,
            base_url: None,
            models: models.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// AI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_groq")]
    pub groq: ProviderSection,

    #[serde(default = "default_openrouter")]
    pub openrouter: ProviderSection,

    /// Per-request timeout towards the providers in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whisper model used for audio transcription (served by Groq)
    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    /// ISO-639-1 hint sent with every transcription
    #[serde(default = "default_language")]
    pub transcription_language: String,

    /// `X-Title` sent to OpenRouter
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

fn default_groq() -> ProviderSection {
    ProviderSection::with_models(&["llama-3.3-70b-versatile", "llama-3.1-8b-instant"])
}

fn default_openrouter() -> ProviderSection {
    ProviderSection::with_models(&["meta-llama/llama-3.3-70b-instruct:free"])
}

const fn default_request_timeout() -> u64 {
    45_000
}

const fn default_max_tokens() -> u32 {
    4096
}

const fn default_temperature() -> f32 {
    0.3
}

fn default_whisper_model() -> String {
    "whisper-large-v3".to_string()
}

fn default_language() -> String {
    "it".to_string()
}

fn default_app_title() -> String {
    "AI Collaboration Canvas".to_string()
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            groq: default_groq(),
            openrouter: default_openrouter(),
            request_timeout_ms: default_request_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            whisper_model: default_whisper_model(),
            transcription_language: default_language(),
            app_title: default_app_title(),
        }
    }
}

impl AiConfig {
    /// Model routes in fallback order: every Groq model, then every OpenRouter model
    ///
    /// Providers without an API key contribute no routes.
    #[must_use]
    pub fn routes(&self, public_url: Option<&str>) -> Vec<ProviderConfig> {
        let mut routes = Vec::new();
        for (provider, section) in [
            (Provider::Groq, &self.groq),
            (Provider::OpenRouter, &self.openrouter),
        ] {
            let Some(key) = &section.api_key else {
                continue;
            };
            for model in &section.models {
                let mut config = ProviderConfig::new(provider, key.clone(), model.clone())
                    .with_timeout_ms(self.request_timeout_ms)
                    .with_max_tokens(self.max_tokens)
                    .with_temperature(self.temperature);
                if let Some(base_url) = &section.base_url {
                    config = config.with_base_url(base_url.clone());
                }
                if provider == Provider::OpenRouter {
                    config = config.with_attribution(
                        public_url.map(ToString::to_string),
                        Some(self.app_title.clone()),
                    );
                }
                routes.push(config);
            }
        }
        routes
    }

    /// Transcription settings, available only with a Groq key
    #[must_use]
    pub fn transcription(&self) -> Option<TranscriptionConfig> {
        let key = self.groq.api_key.clone()?;
        let mut config = TranscriptionConfig::groq(key);
        config.model.clone_from(&self.whisper_model);
        config.language.clone_from(&self.transcription_language);
        if let Some(base_url) = &self.groq.base_url {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        Some(config)
    }
}
