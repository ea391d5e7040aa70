//! Whisper-compatible transcription client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::status_error;
use crate::config::TranscriptionConfig;
use crate::error::InferenceError;
use crate::ports::{AudioClip, Transcription, TranscriptionEngine};

pub struct WhisperClient {
    client: Client,
    config: TranscriptionConfig,
}

impl std::fmt::Debug for WhisperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish_non_exhaustive()
    }
}

impl WhisperClient {
    pub fn new(config: TranscriptionConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn transcriptions_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[async_trait]
impl TranscriptionEngine for WhisperClient {
    #[instrument(skip(self, clip), fields(size_bytes = clip.data.len(), filename = %clip.filename))]
    async fn transcribe(&self, clip: AudioClip) -> Result<Transcription, InferenceError> {
        if clip.data.is_empty() {
            return Err(InferenceError::RequestFailed("audio is empty".to_string()));
        }

        let mime = clip.mime_type();
        let file_part = Part::bytes(clip.data)
            .file_name(clip.filename)
            .mime_str(mime)
            .map_err(|e| InferenceError::RequestFailed(format!("invalid MIME type: {e}")))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(self.transcriptions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::from_transport(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Transcription failed");
            return Err(status_error(status, &body, &self.config.model));
        }

        let parsed: WhisperResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        debug!(
            text_len = parsed.text.len(),
            language = ?parsed.language,
            "Transcription complete"
        );

        Ok(Transcription {
            text: parsed.text.trim().to_string(),
            language: parsed.language,
            duration_secs: parsed.duration,
        })
    }
}
