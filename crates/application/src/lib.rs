//! Application layer - Use cases and orchestration
//!
//! Contains the AI generation use cases, the provider fallback chain,
//! account management and the port definitions implemented by the
//! infrastructure layer.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
