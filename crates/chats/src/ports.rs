//! Ports for the collaborators the mutation core consumes.
//!
//! The policy and the edit orchestrator only talk to these traits. Adapters
//! live in [`crate::repositories`] (SQLite and in-memory) and
//! [`crate::realtime`] (per-user broadcast channels); callers may supply
//! their own.

use async_trait::async_trait;

use crate::entities::{ActingUser, ChatMessage, MessagePatch, RenderedMessage};
use crate::types::{ChatEvent, ChatResult, MessageId, UserId};

/// Read and patch access to a single message record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn exists(&self, message_id: &str) -> ChatResult<bool>;

    async fn find(&self, message_id: &str) -> ChatResult<Option<ChatMessage>>;

    /// Merge `patch` onto the stored record. Only `content` and `edited_at` change.
    async fn apply_patch(&self, message_id: &str, patch: &MessagePatch) -> ChatResult<()>;

    async fn delete(&self, message_id: &str) -> ChatResult<()>;
}

/// Ban status and role facts for users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Unknown users resolve to an ordinary, unbanned member.
    async fn acting_user(&self, user_id: UserId) -> ChatResult<ActingUser>;
}

/// Global (room-independent) privilege checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrivilegeStore: Send + Sync {
    async fn can_global(&self, privilege: &str, user_id: UserId) -> ChatResult<bool>;
}

/// Current room membership. Always read fresh, never cached by the core.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn participants(&self, room_id: &str) -> ChatResult<Vec<UserId>>;
}

/// Formats messages for display to room participants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRenderer: Send + Sync {
    async fn render_for_delivery(
        &self,
        message_ids: &[MessageId],
        viewer: UserId,
        room_id: &str,
    ) -> ChatResult<Vec<RenderedMessage>>;
}

/// Best-effort push of an event to a single user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: UserId, event: &ChatEvent) -> ChatResult<()>;
}

/// Validates user supplied message content before anything is written.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentValidator: Send + Sync {
    async fn check_content(&self, content: &str) -> ChatResult<()>;
}

/// Extension point that may rewrite an edit payload before it is persisted.
///
/// Any `Fn(MessagePatch) -> MessagePatch` closure is a hook:
///
/// ```
/// use std::sync::Arc;
/// use palaver_chats::{EditHook, MessagePatch};
///
/// let hook: Arc<dyn EditHook> = Arc::new(|mut patch: MessagePatch| {
///     patch.content = patch.content.trim().to_string();
///     patch
/// });
/// # let _ = hook;
/// ```
#[async_trait]
pub trait EditHook: Send + Sync {
    async fn transform(&self, hook: &str, patch: MessagePatch) -> ChatResult<MessagePatch>;
}

/// Hook that returns the payload unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHook;

#[async_trait]
impl EditHook for IdentityHook {
    async fn transform(&self, _hook: &str, patch: MessagePatch) -> ChatResult<MessagePatch> {
        Ok(patch)
    }
}

#[async_trait]
impl<F> EditHook for F
where
    F: Fn(MessagePatch) -> MessagePatch + Send + Sync,
{
    async fn transform(&self, _hook: &str, patch: MessagePatch) -> ChatResult<MessagePatch> {
        Ok(self(patch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_identity_hook_passes_payload_through() {
        let patch = MessagePatch::new("unchanged", Utc::now());
        let result = IdentityHook.transform("filter:messaging.edit", patch.clone()).await;

        assert_eq!(result.unwrap(), patch);
    }

    #[tokio::test]
    async fn test_closure_hook_rewrites_content() {
        let hook = |mut patch: MessagePatch| {
            patch.content = patch.content.to_uppercase();
            patch
        };

        let result = hook
            .transform("filter:messaging.edit", MessagePatch::new("shout", Utc::now()))
            .await
            .unwrap();

        assert_eq!(result.content, "SHOUT");
    }
}
