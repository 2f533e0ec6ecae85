//! Shared types for the chat mutation core.
//!
//! This module contains the identifier aliases, the mutation action and
//! decision types, error definitions, and real-time events used across the
//! crate.

pub mod errors;
pub mod events;

use std::fmt;

use serde::{Deserialize, Serialize};

// Re-export common types
pub use errors::{ChatError, ChatResult, ContentError, DenialReason};
pub use events::*;

// Common type aliases
pub type MessageId = String;
pub type RoomId = String;
pub type UserId = i64;

/// The global privilege every mutation requires.
pub const CHAT_PRIVILEGE: &str = "chat";

/// Kind of mutation being requested on an existing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Edit,
    Delete,
}

impl MutationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationAction::Edit => "edit",
            MutationAction::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating the mutation policy. Never partially allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationDecision {
    Allowed,
    Denied(DenialReason),
}

impl MutationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, MutationDecision::Allowed)
    }

    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            MutationDecision::Allowed => None,
            MutationDecision::Denied(reason) => Some(reason),
        }
    }

    /// Convert into a result, turning a denial into [`ChatError::Denied`].
    pub fn into_result(self) -> ChatResult<()> {
        match self {
            MutationDecision::Allowed => Ok(()),
            MutationDecision::Denied(reason) => Err(ChatError::Denied(reason)),
        }
    }
}
