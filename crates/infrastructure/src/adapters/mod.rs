//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod argon2_password_hasher;
mod hosted_inference_adapter;
mod jwt_token_issuer;
mod whisper_transcription_adapter;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use hosted_inference_adapter::HostedInferenceAdapter;
pub use jwt_token_issuer::JwtTokenIssuer;
pub use whisper_transcription_adapter::WhisperTranscriptionAdapter;
