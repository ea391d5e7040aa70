//! HTTP request handlers
//!
//! Each body-carrying route exposes a `schema()` used by the validation
//! layer in front of it.

pub mod ai;
pub mod audio;
pub mod auth;
pub mod chat;
pub mod fallback;
pub mod health;
pub mod migrate;
pub mod suggestions;
