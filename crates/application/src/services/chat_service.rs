//! Assistant chat over the user's canvas

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use domain::ChatTurn;
use serde_json::Value;
use tracing::{debug, instrument};

use super::fallback_chain::{FallbackChain, llm_chain};
use crate::{
    error::ApplicationError,
    ports::{InferencePort, Prompt},
};

/// Number of history turns forwarded to the model
pub const MAX_HISTORY_TURNS: usize = 10;

/// Upper bound on the serialized canvas context included in the prompt
const MAX_CONTEXT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "Sei l'assistente di AI Collaboration Canvas, uno strumento per \
mappare i processi aziendali e valutarne l'automazione. Rispondi in italiano, in modo concreto \
e sintetico.";

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    /// Canvas state sent by the client
    pub context: Option<Value>,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub response: String,
    pub source: String,
    pub generated_at: DateTime<Utc>,
}

/// Chat has no local generator: when every route fails the error surfaces
pub struct ChatService {
    chain: FallbackChain<ChatRequest, String>,
}

impl fmt::Debug for ChatService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatService")
            .field("strategies", &self.chain.labels())
            .finish()
    }
}

impl ChatService {
    pub fn new(routes: &[Arc<dyn InferencePort>]) -> Self {
        Self {
            chain: llm_chain(routes, build_prompt, parse_reply),
        }
    }

    #[instrument(skip(self, request), fields(message_len = request.message.len(), history = request.history.len()))]
    pub async fn reply(&self, request: &ChatRequest) -> Result<ChatReply, ApplicationError> {
        let outcome = self.chain.run(request).await?;
        debug!(source = %outcome.strategy, "Chat reply generated");
        Ok(ChatReply {
            response: outcome.value,
            source: outcome.strategy,
            generated_at: Utc::now(),
        })
    }
}

fn build_prompt(request: &ChatRequest) -> Prompt {
    let mut system = SYSTEM_PROMPT.to_string();
    if let Some(context) = request.context.as_ref().and_then(summarize_context) {
        system.push_str("\n\nContesto attuale del canvas (JSON):\n");
        system.push_str(&context);
    }

    let history: Vec<ChatTurn> = request
        .history
        .iter()
        .filter(|turn| turn.is_client_role() && !turn.content.trim().is_empty())
        .cloned()
        .collect();
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);

    Prompt::new(system, request.message.clone())
        .with_history(history.into_iter().skip(skip).collect())
        .with_temperature(0.7)
        .with_max_tokens(1024)
}

/// Compact JSON of a non-empty object context, truncated to a fixed budget
fn summarize_context(context: &Value) -> Option<String> {
    let object = context.as_object().filter(|o| !o.is_empty())?;
    let json = serde_json::to_string(object).ok()?;
    if json.chars().count() <= MAX_CONTEXT_CHARS {
        return Some(json);
    }
    let mut cut: String = json.chars().take(MAX_CONTEXT_CHARS).collect();
    cut.push('…');
    Some(cut)
}

#[allow(clippy::unnecessary_wraps)]
fn parse_reply(raw: &str) -> Result<String, ApplicationError> {
    Ok(raw.trim().to_string())
}
