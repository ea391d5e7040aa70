//! Domain entities - Objects with identity and lifecycle

mod chat_turn;
mod evaluation;
mod user;
mod workflow;

pub use chat_turn::{ChatRole, ChatTurn};
pub use evaluation::{Evaluation, Quadrant, SCORE_MAX, SCORE_MIDPOINT, SCORE_MIN};
pub use user::{PublicUser, User};
pub use workflow::Workflow;
