use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

/// Represents a stored chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    /// Opaque message identifier
    pub id: String,
    /// Room this message was posted in
    pub room_id: String,
    /// User who sent the message
    pub author_id: UserId,
    /// Message content
    pub content: String,
    /// Generated by the platform rather than a participant
    pub system: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp
    pub edited_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Create a new participant message
    pub fn new(room_id: impl Into<String>, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.into(),
            author_id,
            content: content.into(),
            system: false,
            created_at: Utc::now(),
            edited_at: None,
        }
    }

    /// Create a platform-generated message
    pub fn system(room_id: impl Into<String>, author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            system: true,
            ..Self::new(room_id, author_id, content)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Whether `user_id` owns this message. System messages have no owner.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        !self.system && self.author_id == user_id
    }

    /// Merge a patch into the message. Author, id and system flag are untouched.
    pub fn apply(&mut self, patch: &MessagePatch) {
        self.content = patch.content.clone();
        self.edited_at = Some(patch.edited_at);
    }
}

/// Mutation payload produced by an edit and passed through the edit hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePatch {
    pub content: String,
    #[serde(rename = "edited")]
    pub edited_at: DateTime<Utc>,
}

impl MessagePatch {
    pub fn new(content: impl Into<String>, edited_at: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            edited_at,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Display-ready view of a message, as delivered to room participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub message_id: String,
    pub room_id: String,
    #[serde(rename = "fromuid")]
    pub from_uid: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub system: bool,
    /// True when the viewer authored the message
    #[serde(rename = "self")]
    pub own: bool,
}

impl RenderedMessage {
    pub fn from_message(message: &ChatMessage, viewer: UserId) -> Self {
        Self {
            message_id: message.id.clone(),
            room_id: message.room_id.clone(),
            from_uid: message.author_id,
            content: message.content.clone(),
            timestamp: message.created_at,
            edited_at: message.edited_at,
            system: message.system,
            own: message.is_owned_by(viewer),
        }
    }
}
