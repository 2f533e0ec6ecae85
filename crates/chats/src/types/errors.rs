//! Error types for the chat mutation core.

use thiserror::Error;

use super::MutationAction;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Why the mutation policy refused an edit or delete.
///
/// Every variant maps to exactly one machine code so presentation layers can
/// render a specific message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("message does not exist")]
    InvalidMessage,

    #[error("chat is disabled")]
    ChatDisabled,

    #[error("chat message editing is disabled")]
    ChatEditingDisabled,

    #[error("user is banned")]
    UserBanned,

    #[error("user lacks the global chat privilege")]
    NoPrivilege,

    #[error("the {action} window of {limit_seconds} seconds has expired")]
    DurationExpired {
        action: MutationAction,
        limit_seconds: u64,
    },

    #[error("not allowed to {action} this message")]
    CannotMutate { action: MutationAction },
}

impl DenialReason {
    /// Stable, machine-distinguishable code for this denial.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "invalid-message",
            Self::ChatDisabled => "chat-disabled",
            Self::ChatEditingDisabled => "chat-editing-disabled",
            Self::UserBanned => "user-banned",
            Self::NoPrivilege => "no-privilege",
            Self::DurationExpired { .. } => "mutation-duration-expired",
            Self::CannotMutate { .. } => "cannot-mutate",
        }
    }

    /// Translation key understood by the web client's language files.
    ///
    /// ```
    /// use palaver_chats::{DenialReason, MutationAction};
    ///
    /// let reason = DenialReason::DurationExpired {
    ///     action: MutationAction::Edit,
    ///     limit_seconds: 60,
    /// };
    /// assert_eq!(reason.translation_key(), "[[error:chat-edit-duration-expired, 60]]");
    /// ```
    pub fn translation_key(&self) -> String {
        match self {
            Self::InvalidMessage => "[[error:invalid-mid]]".to_string(),
            Self::ChatDisabled => "[[error:chat-disabled]]".to_string(),
            Self::ChatEditingDisabled => "[[error:chat-message-editing-disabled]]".to_string(),
            Self::UserBanned => "[[error:user-banned]]".to_string(),
            Self::NoPrivilege => "[[error:no-privileges]]".to_string(),
            Self::DurationExpired {
                action,
                limit_seconds,
            } => format!("[[error:chat-{action}-duration-expired, {limit_seconds}]]"),
            Self::CannotMutate { action } => format!("[[error:cant-{action}-chat-message]]"),
        }
    }
}

/// Failures raised by content validators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("message content cannot be empty")]
    Empty,

    #[error("message content too long (max {max_length} characters)")]
    TooLong { max_length: usize },

    #[error("message content rejected: {reason}")]
    Rejected { reason: String },
}

impl ContentError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "invalid-message-content",
            Self::TooLong { .. } => "content-too-long",
            Self::Rejected { .. } => "content-rejected",
        }
    }
}

/// Main error type for the chat mutation core
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Mutation denied: {0}")]
    Denied(#[from] DenialReason),

    #[error("Invalid content: {0}")]
    Content(#[from] ContentError),

    #[error("Message content is empty after processing")]
    InvalidMessageContent,

    #[error("Message not found: {id}")]
    MessageNotFound { id: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Edit hook failed: {message}")]
    Hook { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ChatError {
    /// Create a not found error for messages
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::MessageNotFound { id: id.into() }
    }

    /// Create an edit hook error
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Machine code for the failure; denials and content errors keep their own codes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Denied(reason) => reason.code(),
            Self::Content(error) => error.code(),
            Self::InvalidMessageContent => "invalid-message-content",
            Self::MessageNotFound { .. } => "invalid-message",
            Self::Database(_) => "database-error",
            Self::Hook { .. } => "hook-error",
            Self::Internal { .. } => "internal-error",
        }
    }

    /// The denial reason, when this error came from the mutation policy.
    pub fn denial(&self) -> Option<&DenialReason> {
        match self {
            Self::Denied(reason) => Some(reason),
            _ => None,
        }
    }
}
