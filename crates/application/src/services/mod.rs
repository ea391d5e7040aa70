//! Application services (use cases)

pub mod ai_output;
mod audio_service;
mod auth_service;
mod bpmn_service;
mod bpmn_template;
mod chat_service;
mod fallback_chain;
mod prompts;
mod suggestion_service;
mod vba_service;
mod vba_template;

pub use audio_service::{
    AudioExtraction, AudioWorkflowService, DEFAULT_AUDIO_FILENAME, MAX_AUDIO_BYTES, audio_filename,
    decode_audio_payload, parse_workflows,
};
pub use auth_service::{AuthService, AuthSession, RegisterCommand};
pub use bpmn_service::{ArtifactRequest, BpmnService, GeneratedArtifact, parse_bpmn};
pub use bpmn_template::render_bpmn;
pub use chat_service::{ChatReply, ChatRequest, ChatService, MAX_HISTORY_TURNS};
pub use fallback_chain::{ChainOutcome, FallbackChain, LlmStrategy, LocalStrategy, OutputParser, Strategy, llm_chain};
pub use suggestion_service::{
    DEFAULT_HOURLY_COST, MatrixEntry, MatrixReport, Suggestion, SuggestionKind, SuggestionRequest,
    SuggestionService,
};
pub use vba_service::{VbaService, parse_vba};
pub use vba_template::{macro_name, render_vba};
