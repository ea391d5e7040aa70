//! Voice notes to workflow cards

use axum::{Json, extract::State};
use domain::Workflow;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::ApiError,
    middleware::{FieldRule, ValidatedJson, ValidationSchema},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AudioRequest {
    /// Base64 payload, optionally as a `data:` URL
    pub audio: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub success: bool,
    pub transcription: String,
    pub workflows: Vec<Workflow>,
}

pub fn schema() -> ValidationSchema {
    let filename = FieldRule::string().length(Some(1), Some(255));
    let filename = match Regex::new(r"^[\w\-. ]+$") {
        Ok(pattern) => filename.pattern(pattern),
        Err(_) => filename,
    };
    ValidationSchema::new()
        .field("audio", FieldRule::string().required())
        .field("filename", filename.message("Nome file non valido"))
}

#[instrument(skip(state, request), fields(payload_len = request.audio.len()))]
pub async fn process_audio(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AudioRequest>,
) -> Result<Json<AudioResponse>, ApiError> {
    let audio = state.audio.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("no transcription provider configured".to_string())
    })?;

    let extraction = audio
        .process(&request.audio, request.filename.as_deref())
        .await?;

    Ok(Json(AudioResponse {
        success: true,
        transcription: extraction.transcription,
        workflows: extraction.workflows,
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::middleware::validation::validate;

    #[test]
    fn audio_is_required() {
        let violations = validate(&json!({"filename": "nota.webm"}), &schema());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "audio");
    }

    #[test]
    fn filename_rejects_path_segments() {
        let violations = validate(&json!({"audio": "AAAA", "filename": "../etc/passwd"}), &schema());
        assert_eq!(violations[0].message, "Nome file non valido");

        assert!(validate(&json!({"audio": "AAAA", "filename": "nota vocale.m4a"}), &schema()).is_empty());
    }
}
