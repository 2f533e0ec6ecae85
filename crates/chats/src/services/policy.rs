//! Authorization policy for editing and deleting chat messages.
//!
//! The policy is an ordered chain of guards evaluated top to bottom; the
//! first guard that fails decides the outcome:
//!
//! 1. the message exists
//! 2. chat is enabled
//! 3. editing is enabled (edits only)
//! 4. the actor is not banned
//! 5. the actor holds the global `chat` privilege
//! 6. elevated actors may mutate any non-system message
//! 7. the action's time window has not expired
//! 8. owners may mutate their own non-system messages
//! 9. everything else is denied
//!
//! Collaborators are consulted lazily, so a guard that fails early skips the
//! lookups of every later guard.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use palaver_config::ChatConfig;
use tracing::debug;

use crate::ports::{MessageStore, PrivilegeStore, UserDirectory};
use crate::types::{
    ChatResult, DenialReason, MutationAction, MutationDecision, UserId, CHAT_PRIVILEGE,
};
use crate::utils::{Clock, SystemClock};

#[derive(Clone)]
pub struct MutationPolicy {
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
    privileges: Arc<dyn PrivilegeStore>,
    config: ChatConfig,
    clock: Arc<dyn Clock>,
}

impl MutationPolicy {
    pub fn new(
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
        privileges: Arc<dyn PrivilegeStore>,
        config: ChatConfig,
    ) -> Self {
        Self {
            messages,
            users,
            privileges,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Decide whether `user_id` may perform `action` on `message_id`.
    ///
    /// `Err` is reserved for collaborator failures; refusals are returned as
    /// [`MutationDecision::Denied`].
    pub async fn evaluate(
        &self,
        message_id: &str,
        user_id: UserId,
        action: MutationAction,
    ) -> ChatResult<MutationDecision> {
        let decision = self.run_guards(message_id, user_id, action).await?;

        match &decision {
            MutationDecision::Allowed => {
                debug!(message_id, user_id, %action, "chat mutation allowed");
            }
            MutationDecision::Denied(reason) => {
                debug!(message_id, user_id, %action, reason = reason.code(), "chat mutation denied");
            }
        }

        Ok(decision)
    }

    /// Fails with [`crate::ChatError::Denied`] unless the edit is allowed.
    pub async fn can_edit(&self, message_id: &str, user_id: UserId) -> ChatResult<()> {
        self.evaluate(message_id, user_id, MutationAction::Edit)
            .await?
            .into_result()
    }

    /// Fails with [`crate::ChatError::Denied`] unless the delete is allowed.
    pub async fn can_delete(&self, message_id: &str, user_id: UserId) -> ChatResult<()> {
        self.evaluate(message_id, user_id, MutationAction::Delete)
            .await?
            .into_result()
    }

    async fn run_guards(
        &self,
        message_id: &str,
        user_id: UserId,
        action: MutationAction,
    ) -> ChatResult<MutationDecision> {
        use MutationDecision::{Allowed, Denied};

        if !self.messages.exists(message_id).await? {
            return Ok(Denied(DenialReason::InvalidMessage));
        }

        if self.config.disable_chat {
            return Ok(Denied(DenialReason::ChatDisabled));
        }

        if action == MutationAction::Edit && self.config.disable_editing {
            return Ok(Denied(DenialReason::ChatEditingDisabled));
        }

        let actor = self.users.acting_user(user_id).await?;
        if actor.banned {
            return Ok(Denied(DenialReason::UserBanned));
        }

        if !self.privileges.can_global(CHAT_PRIVILEGE, user_id).await? {
            return Ok(Denied(DenialReason::NoPrivilege));
        }

        // The message may have been removed since the existence check.
        let Some(message) = self.messages.find(message_id).await? else {
            return Ok(Denied(DenialReason::InvalidMessage));
        };

        if actor.is_elevated() && !message.system {
            return Ok(Allowed);
        }

        if let Some(limit_seconds) = self.window_for(action) {
            if window_expired(message.created_at, self.clock.now(), limit_seconds) {
                return Ok(Denied(DenialReason::DurationExpired {
                    action,
                    limit_seconds,
                }));
            }
        }

        if message.is_owned_by(actor.id) {
            return Ok(Allowed);
        }

        Ok(Denied(DenialReason::CannotMutate { action }))
    }

    fn window_for(&self, action: MutationAction) -> Option<u64> {
        match action {
            MutationAction::Edit => self.config.edit_window(),
            MutationAction::Delete => self.config.delete_window(),
        }
    }
}

/// Strictly greater than: elapsed time equal to the limit is still inside the window.
fn window_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, limit_seconds: u64) -> bool {
    let Some(limit) = i64::try_from(limit_seconds)
        .ok()
        .and_then(Duration::try_seconds)
    else {
        return false;
    };

    now.signed_duration_since(created_at) > limit
}
