//! Domain layer for the AI Collaboration Canvas
//!
//! Contains the workflow model, the 2×2 evaluation matrix, user accounts,
//! value objects and domain errors. This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod serde_null;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use serde_null::null_as_default;
pub use value_objects::*;
