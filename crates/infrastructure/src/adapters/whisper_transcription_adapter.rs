//! Transcription adapter - Implements TranscriptionPort using the Whisper client

use std::sync::Arc;

use ai_core::{AudioClip, InferenceError, TranscriptionConfig, TranscriptionEngine, WhisperClient};
use application::{error::ApplicationError, ports::TranscriptionPort};
use async_trait::async_trait;
use tracing::{debug, instrument};

pub struct WhisperTranscriptionAdapter {
    engine: Arc<dyn TranscriptionEngine>,
}

impl std::fmt::Debug for WhisperTranscriptionAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriptionAdapter")
            .finish_non_exhaustive()
    }
}

impl WhisperTranscriptionAdapter {
    pub fn new(config: TranscriptionConfig) -> Result<Self, ApplicationError> {
        let client = WhisperClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::from_engine(Arc::new(client)))
    }

    pub fn from_engine(engine: Arc<dyn TranscriptionEngine>) -> Self {
        Self { engine }
    }

    fn map_error(e: InferenceError) -> ApplicationError {
        if e.is_saturation() {
            return ApplicationError::UpstreamSaturated(format!("transcription: {e}"));
        }
        ApplicationError::ExternalService(format!("transcription: {e}"))
    }
}

#[async_trait]
impl TranscriptionPort for WhisperTranscriptionAdapter {
    #[instrument(skip(self, audio), fields(size_bytes = audio.len(), filename = %filename))]
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: String,
    ) -> Result<String, ApplicationError> {
        let transcription = self
            .engine
            .transcribe(AudioClip::new(audio, filename))
            .await
            .map_err(Self::map_error)?;

        debug!(
            chars = transcription.text.len(),
            language = ?transcription.language,
            duration_secs = ?transcription.duration_secs,
            "Transcription completed"
        );
        Ok(transcription.text)
    }
}

#[cfg(test)]
mod tests {
    use ai_core::Transcription;

    use super::*;

    struct FixedEngine(fn() -> Result<Transcription, InferenceError>);

    #[async_trait]
    impl TranscriptionEngine for FixedEngine {
        async fn transcribe(&self, _clip: AudioClip) -> Result<Transcription, InferenceError> {
            (self.0)()
        }
    }

    #[tokio::test]
    async fn returns_transcribed_text() {
        let adapter = WhisperTranscriptionAdapter::from_engine(Arc::new(FixedEngine(|| {
            Ok(Transcription {
                text: "Ogni lunedì preparo il report".to_string(),
                language: Some("italian".to_string()),
                duration_secs: Some(3.2),
            })
        })));
        let text = adapter
            .transcribe(vec![1, 2, 3], "memo.webm".to_string())
            .await
            .unwrap();
        assert_eq!(text, "Ogni lunedì preparo il report");
    }

    #[tokio::test]
    async fn rate_limit_is_saturation() {
        let adapter = WhisperTranscriptionAdapter::from_engine(Arc::new(FixedEngine(|| {
            Err(InferenceError::RateLimited)
        })));
        let err = adapter
            .transcribe(vec![1], "memo.webm".to_string())
            .await
            .unwrap_err();
        assert!(err.is_saturation());
    }

    #[tokio::test]
    async fn server_error_is_external() {
        let adapter = WhisperTranscriptionAdapter::from_engine(Arc::new(FixedEngine(|| {
            Err(InferenceError::ServerError {
                status: 500,
                message: "boom".to_string(),
            })
        })));
        let err = adapter
            .transcribe(vec![1], "memo.webm".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ExternalService(_)));
    }
}
