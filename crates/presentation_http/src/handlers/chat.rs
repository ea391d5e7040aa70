//! Assistant chat handler

use application::ChatRequest as ChatCommand;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use domain::{ChatTurn, null_as_default};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::{
    error::ApiError,
    middleware::{FieldRule, ItemKind, ValidatedJson, ValidationSchema},
    state::AppState,
};

pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Chat request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Canvas state the answer should take into account
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conversation_history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

pub fn schema() -> ValidationSchema {
    ValidationSchema::new()
        .field(
            "message",
            FieldRule::string()
                .required()
                .length(Some(1), Some(MAX_MESSAGE_CHARS)),
        )
        .field("context", FieldRule::object())
        .field(
            "conversationHistory",
            FieldRule::array()
                .items(ItemKind::Object)
                .length(None, Some(100))
                .custom(|value| value.as_array().is_some_and(|turns| turns.iter().all(is_turn)))
                .message("Cronologia della conversazione non valida"),
        )
}

fn is_turn(turn: &Value) -> bool {
    matches!(
        turn.get("role").and_then(Value::as_str),
        Some("user" | "assistant")
    ) && turn.get("content").is_some_and(Value::is_string)
}

/// Handle a chat request
#[instrument(skip(state, request), fields(message_len = request.message.len()))]
pub async fn chat(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let command = ChatCommand {
        message: request.message,
        context: request.context,
        history: request.conversation_history,
    };
    let reply = state.chat.reply(&command).await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        timestamp: reply.generated_at,
    }))
}
