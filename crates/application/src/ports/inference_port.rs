//! Inference port - Interface for LLM inference

use async_trait::async_trait;
use domain::ChatTurn;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// A fully built prompt
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    /// Earlier turns, oldest first
    pub history: Vec<ChatTurn>,
    pub user: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history: Vec::new(),
            user: user.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Result of an inference call
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Generated response content
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Number of tokens used (if available)
    pub tokens_used: Option<u32>,
    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Port for one provider/model route
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InferencePort: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<InferenceResult, ApplicationError>;

    /// `provider/model` label used in logs and responses
    fn label(&self) -> String;
}
