//! Domain entities for the chat mutation core.
//!
//! Entities are the data shapes the policy and the edit orchestrator reason
//! about. They carry no persistence logic.

pub mod message;
pub mod user;

// Re-export all entities
pub use message::{ChatMessage, MessagePatch, RenderedMessage};
pub use user::ActingUser;
