//! OpenAI-compatible HTTP clients

mod chat;
mod transcription;

pub use chat::ChatCompletionsClient;
pub use transcription::WhisperClient;

use serde::Deserialize;

use crate::error::InferenceError;

/// Error envelope shared by OpenAI-compatible APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Map a non-success status and body to an [`InferenceError`]
fn status_error(status: reqwest::StatusCode, body: &str, model: &str) -> InferenceError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map_or_else(|_| body.chars().take(200).collect(), |b| b.error.message);

    match status.as_u16() {
        401 | 403 => InferenceError::Unauthorized,
        404 => InferenceError::ModelNotAvailable(model.to_string()),
        429 => InferenceError::RateLimited,
        code => InferenceError::ServerError {
            status: code,
            message,
        },
    }
}
