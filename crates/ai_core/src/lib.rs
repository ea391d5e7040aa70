//! AI Core - Clients for hosted LLM providers
//!
//! Talks to OpenAI-compatible chat-completion endpoints (Groq, OpenRouter)
//! and to the Whisper-compatible transcription endpoint exposed by Groq.

pub mod config;
pub mod error;
pub mod openai_compat;
pub mod ports;

pub use config::{Provider, ProviderConfig, TranscriptionConfig};
pub use error::InferenceError;
pub use openai_compat::{ChatCompletionsClient, WhisperClient};
pub use ports::{
    AudioClip, InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse,
    TokenUsage, Transcription, TranscriptionEngine,
};
