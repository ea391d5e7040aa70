//! Hosted inference adapter - Implements InferencePort on an OpenAI-compatible provider

use std::{sync::Arc, time::Instant};

use ai_core::{
    ChatCompletionsClient, InferenceEngine, InferenceError, InferenceMessage, InferenceRequest,
    ProviderConfig,
};
use application::{
    error::ApplicationError,
    ports::{InferencePort, InferenceResult, Prompt},
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// One provider/model route, usable as a fallback-chain step
pub struct HostedInferenceAdapter {
    engine: Arc<dyn InferenceEngine>,
    label: String,
}

impl std::fmt::Debug for HostedInferenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedInferenceAdapter")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl HostedInferenceAdapter {
    /// Create an adapter talking to the provider described by `config`
    pub fn new(config: ProviderConfig) -> Result<Self, ApplicationError> {
        let label = config.label();
        let engine = ChatCompletionsClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self {
            engine: Arc::new(engine),
            label,
        })
    }

    /// Wrap an existing engine
    pub fn from_engine(engine: Arc<dyn InferenceEngine>) -> Self {
        let label = format!("{}/{}", engine.provider().name(), engine.model());
        Self { engine, label }
    }

    /// Build one adapter per configured route, in order
    pub fn from_routes(
        routes: Vec<ProviderConfig>,
    ) -> Result<Vec<Arc<dyn InferencePort>>, ApplicationError> {
        routes
            .into_iter()
            .map(|config| Self::new(config).map(|a| Arc::new(a) as Arc<dyn InferencePort>))
            .collect()
    }

    fn map_error(&self, e: InferenceError) -> ApplicationError {
        if e.is_saturation() {
            return ApplicationError::UpstreamSaturated(format!("{}: {e}", self.label));
        }
        match e {
            InferenceError::ConnectionFailed(_) | InferenceError::Timeout(_) => {
                ApplicationError::ExternalService(format!("{}: {e}", self.label))
            },
            other => ApplicationError::Inference(format!("{}: {other}", self.label)),
        }
    }

    fn to_request(prompt: &Prompt) -> InferenceRequest {
        let mut messages = Vec::with_capacity(prompt.history.len() + 2);
        messages.push(InferenceMessage::system(prompt.system.clone()));
        messages.extend(prompt.history.iter().map(InferenceMessage::from));
        messages.push(InferenceMessage::user(prompt.user.clone()));

        let mut request = InferenceRequest::from_messages(messages);
        if let Some(max_tokens) = prompt.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = prompt.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}

#[async_trait]
impl InferencePort for HostedInferenceAdapter {
    #[instrument(skip(self, prompt), fields(route = %self.label, user_len = prompt.user.len()))]
    async fn complete(&self, prompt: &Prompt) -> Result<InferenceResult, ApplicationError> {
        let start = Instant::now();

        let response = self
            .engine
            .generate(Self::to_request(prompt))
            .await
            .map_err(|e| self.map_error(e))?;

        #[allow(clippy::cast_possible_truncation)]
        let latency_ms = start.elapsed().as_millis() as u64;

        debug!(
            model = %response.model,
            tokens = ?response.usage.as_ref().map(|u| u.total_tokens),
            latency_ms = latency_ms,
            "Inference completed"
        );

        Ok(InferenceResult {
            content: response.content,
            model: response.model,
            tokens_used: response.usage.map(|u| u.total_tokens),
            latency_ms,
        })
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}
