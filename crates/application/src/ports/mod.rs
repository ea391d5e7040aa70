//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod credential_port;
mod database_health_port;
mod inference_port;
mod migration_port;
mod transcription_port;
mod user_store;

#[cfg(test)]
pub use credential_port::{MockPasswordHasherPort, MockTokenIssuerPort};
pub use credential_port::{IssuedToken, PasswordHasherPort, TokenClaims, TokenIssuerPort};
#[cfg(test)]
pub use database_health_port::MockDatabaseHealthPort;
pub use database_health_port::{DatabaseHealth, DatabaseHealthPort};
#[cfg(test)]
pub use inference_port::MockInferencePort;
pub use inference_port::{InferencePort, InferenceResult, Prompt};
#[cfg(test)]
pub use migration_port::MockMigrationPort;
pub use migration_port::MigrationPort;
#[cfg(test)]
pub use transcription_port::MockTranscriptionPort;
pub use transcription_port::TranscriptionPort;
#[cfg(test)]
pub use user_store::MockUserStore;
pub use user_store::UserStore;
