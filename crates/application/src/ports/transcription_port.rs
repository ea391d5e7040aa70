//! Speech-to-text port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranscriptionPort: Send + Sync {
    /// Transcribe an audio file, returning the recognised text
    async fn transcribe(&self, audio: Vec<u8>, filename: String)
    -> Result<String, ApplicationError>;
}
