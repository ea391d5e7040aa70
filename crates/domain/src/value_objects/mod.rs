//! Value Objects - Immutable, identity-less domain primitives

mod email_address;
mod password;
mod user_id;
mod workflow_id;

pub use email_address::EmailAddress;
pub use password::Password;
pub use user_id::UserId;
pub use workflow_id::WorkflowId;
