//! Ordered provider fallback
//!
//! A [`FallbackChain`] tries each [`Strategy`] in turn and returns the first
//! success. Typical chains are primary model → secondary model → secondary
//! provider → deterministic local generator.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    error::ApplicationError,
    ports::{InferencePort, Prompt},
};

/// One way of producing a `T` from an input `I`
#[async_trait]
pub trait Strategy<I, T>: Send + Sync {
    fn label(&self) -> String;

    /// Deterministic generators report their output as a fallback
    fn is_local(&self) -> bool {
        false
    }

    async fn attempt(&self, input: &I) -> Result<T, ApplicationError>;
}

/// Value produced by a chain together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome<T> {
    pub value: T,
    /// Label of the strategy that succeeded
    pub strategy: String,
    /// True when the first strategy did not produce the value, or a local
    /// generator did
    pub fallback: bool,
}

pub struct FallbackChain<I, T> {
    strategies: Vec<Box<dyn Strategy<I, T>>>,
}

impl<I, T> fmt::Debug for FallbackChain<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackChain")
            .field("strategies", &self.strategies.len())
            .finish()
    }
}

impl<I, T> Default for FallbackChain<I, T> {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }
}

impl<I: Sync, T: Send> FallbackChain<I, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy to the end of the chain
    #[must_use]
    pub fn then(mut self, strategy: impl Strategy<I, T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.label()).collect()
    }

    /// Try every strategy in order
    ///
    /// When all of them fail, a saturation error is reported if any provider
    /// was saturated; otherwise the last failure is returned.
    pub async fn run(&self, input: &I) -> Result<ChainOutcome<T>, ApplicationError> {
        let mut saturated: Option<String> = None;
        let mut last_error: Option<ApplicationError> = None;

        for (position, strategy) in self.strategies.iter().enumerate() {
            let label = strategy.label();
            match strategy.attempt(input).await {
                Ok(value) => {
                    let fallback = position > 0 || strategy.is_local();
                    if fallback {
                        warn!(strategy = %label, position, "Fallback strategy succeeded");
                    } else {
                        debug!(strategy = %label, "Primary strategy succeeded");
                    }
                    return Ok(ChainOutcome {
                        value,
                        strategy: label,
                        fallback,
                    });
                },
                Err(e) => {
                    warn!(strategy = %label, error = %e, "Strategy failed, trying next");
                    if e.is_saturation() {
                        saturated.get_or_insert(label);
                    }
                    last_error = Some(e);
                },
            }
        }

        if let Some(label) = saturated {
            return Err(ApplicationError::UpstreamSaturated(label));
        }
        Err(last_error.unwrap_or_else(|| {
            ApplicationError::Configuration("no AI provider configured".to_string())
        }))
    }
}

/// Parser turning raw model output into a value
pub type OutputParser<T> = fn(&str) -> Result<T, ApplicationError>;

/// Calls one inference route and parses its output
pub struct LlmStrategy<I, T> {
    port: Arc<dyn InferencePort>,
    build_prompt: fn(&I) -> Prompt,
    parse: OutputParser<T>,
}

impl<I, T> LlmStrategy<I, T> {
    pub fn new(
        port: Arc<dyn InferencePort>,
        build_prompt: fn(&I) -> Prompt,
        parse: OutputParser<T>,
    ) -> Self {
        Self {
            port,
            build_prompt,
            parse,
        }
    }
}

#[async_trait]
impl<I: Sync, T: Send> Strategy<I, T> for LlmStrategy<I, T> {
    fn label(&self) -> String {
        self.port.label()
    }

    async fn attempt(&self, input: &I) -> Result<T, ApplicationError> {
        let prompt = (self.build_prompt)(input);
        let result = self.port.complete(&prompt).await?;
        debug!(
            model = %result.model,
            tokens = ?result.tokens_used,
            latency_ms = result.latency_ms,
            "Model output received"
        );
        (self.parse)(&result.content)
    }
}

/// Deterministic generator that never fails
pub struct LocalStrategy<I, T> {
    label: &'static str,
    generate: fn(&I) -> T,
}

impl<I, T> LocalStrategy<I, T> {
    pub const fn new(label: &'static str, generate: fn(&I) -> T) -> Self {
        Self { label, generate }
    }
}

#[async_trait]
impl<I: Sync, T: Send> Strategy<I, T> for LocalStrategy<I, T> {
    fn label(&self) -> String {
        self.label.to_string()
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn attempt(&self, input: &I) -> Result<T, ApplicationError> {
        Ok((self.generate)(input))
    }
}

/// Chain of LLM routes for the given ports, in order
pub fn llm_chain<I: Sync + 'static, T: Send + 'static>(
    ports: &[Arc<dyn InferencePort>],
    build_prompt: fn(&I) -> Prompt,
    parse: OutputParser<T>,
) -> FallbackChain<I, T> {
    ports.iter().fold(FallbackChain::new(), |chain, port| {
        chain.then(LlmStrategy::new(Arc::clone(port), build_prompt, parse))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InferenceResult, MockInferencePort};

    fn port(
        label: &'static str,
        reply: Result<&'static str, fn() -> ApplicationError>,
    ) -> Arc<dyn InferencePort> {
        let mut mock = MockInferencePort::new();
        mock.expect_label().return_const(label.to_string());
        mock.expect_complete().returning(move |_| match reply {
            Ok(content) => Ok(InferenceResult {
                content: content.to_string(),
                model: label.to_string(),
                tokens_used: None,
                latency_ms: 1,
            }),
            Err(make) => Err(make()),
        });
        Arc::new(mock)
    }

    #[allow(clippy::ptr_arg)]
    fn prompt(input: &String) -> Prompt {
        Prompt::new("system", input.clone())
    }

    #[allow(clippy::unnecessary_wraps)]
    fn keep(raw: &str) -> Result<String, ApplicationError> {
        Ok(raw.to_string())
    }

    fn non_empty_digits(raw: &str) -> Result<String, ApplicationError> {
        if raw.chars().all(|c| c.is_ascii_digit()) {
            Ok(raw.to_string())
        } else {
            Err(ApplicationError::InvalidAiResponse {
                reason: "not digits".to_string(),
                preview: raw.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn primary_success_is_not_fallback() {
        let chain = llm_chain(&[port("groq/a", Ok("uno"))], prompt, keep);
        let outcome = chain.run(&"x".to_string()).await.unwrap();
        assert_eq!(outcome.value, "uno");
        assert_eq!(outcome.strategy, "groq/a");
        assert!(!outcome.fallback);
    }

    #[tokio::test]
    async fn failure_moves_to_next_strategy() {
        let chain = llm_chain(
            &[
                port("groq/a", Err(|| ApplicationError::Inference("boom".to_string()))),
                port("groq/b", Ok("due")),
            ],
            prompt,
            keep,
        );
        let outcome = chain.run(&"x".to_string()).await.unwrap();
        assert_eq!(outcome.value, "due");
        assert!(outcome.fallback);
    }

    #[tokio::test]
    async fn unparsable_output_falls_through_to_local() {
        let chain = llm_chain(&[port("groq/a", Ok("not digits"))], prompt, non_empty_digits)
            .then(LocalStrategy::new("local", |_: &String| "42".to_string()));
        let outcome = chain.run(&"x".to_string()).await.unwrap();
        assert_eq!(outcome.value, "42");
        assert_eq!(outcome.strategy, "local");
        assert!(outcome.fallback);
    }

    #[tokio::test]
    async fn saturation_wins_over_last_error() {
        let chain = llm_chain(
            &[
                port("groq/a", Err(|| ApplicationError::UpstreamSaturated("groq/a".to_string()))),
                port("openrouter/b", Err(|| ApplicationError::Inference("down".to_string()))),
            ],
            prompt,
            keep,
        );
        let err = chain.run(&"x".to_string()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::UpstreamSaturated(label) if label == "groq/a"));
    }

    #[tokio::test]
    async fn last_error_is_returned_without_saturation() {
        let chain = llm_chain(&[port("groq/a", Ok("abc"))], prompt, non_empty_digits);
        let err = chain.run(&"x".to_string()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidAiResponse { .. }));
    }

    #[tokio::test]
    async fn empty_chain_is_a_configuration_error() {
        let chain: FallbackChain<String, String> = FallbackChain::new();
        assert!(chain.is_empty());
        let err = chain.run(&"x".to_string()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Configuration(_)));
    }

    #[test]
    fn labels_follow_insertion_order() {
        let chain = llm_chain(&[port("groq/a", Ok("")), port("groq/b", Ok(""))], prompt, keep)
            .then(LocalStrategy::new("local", |_: &String| String::new()));
        assert_eq!(chain.labels(), vec!["groq/a", "groq/b", "local"]);
        assert_eq!(chain.len(), 3);
    }

    #[tokio::test]
    async fn local_only_chain_reports_fallback() {
        let chain = FallbackChain::new().then(LocalStrategy::new("local", |s: &String| s.clone()));
        let outcome = chain.run(&"eco".to_string()).await.unwrap();
        assert_eq!(outcome.value, "eco");
        assert!(outcome.fallback);
    }
}
