//! Message service coordinating edits and deletes.
//!
//! An edit goes through validation, a no-op check, the edit hook, a blank
//! check, persistence and finally a fire-and-forget fan-out of the
//! re-rendered message to every current room participant.

use std::sync::Arc;

use palaver_config::ChatConfig;
use tracing::{debug, info, warn};

use crate::entities::MessagePatch;
use crate::ports::{
    ContentValidator, EditHook, IdentityHook, MessageRenderer, MessageStore, Notifier,
    PrivilegeStore, RoomDirectory, UserDirectory,
};
use crate::services::{MutationPolicy, StoredMessageRenderer};
use crate::types::{ChatError, ChatEvent, ChatResult, UserId};
use crate::utils::{Clock, LengthValidator, SystemClock};

/// Hook name the edit payload is passed through before persistence.
pub const EDIT_FILTER_HOOK: &str = "filter:messaging.edit";

/// Collaborators used by [`MessageService`].
#[derive(Clone)]
pub struct MessagingPorts {
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserDirectory>,
    pub privileges: Arc<dyn PrivilegeStore>,
    pub rooms: Arc<dyn RoomDirectory>,
    pub renderer: Arc<dyn MessageRenderer>,
    pub notifier: Arc<dyn Notifier>,
    pub validator: Arc<dyn ContentValidator>,
    pub hook: Arc<dyn EditHook>,
    pub clock: Arc<dyn Clock>,
}

impl MessagingPorts {
    /// Wire the required stores with default rendering, validation, hook and clock.
    pub fn new(
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
        privileges: Arc<dyn PrivilegeStore>,
        rooms: Arc<dyn RoomDirectory>,
        notifier: Arc<dyn Notifier>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            renderer: Arc::new(StoredMessageRenderer::new(messages.clone())),
            validator: Arc::new(LengthValidator::new(config.maximum_message_length)),
            hook: Arc::new(IdentityHook),
            clock: Arc::new(SystemClock),
            messages,
            users,
            privileges,
            rooms,
            notifier,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn MessageRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ContentValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn EditHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Result of a successful edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content was identical to what is stored; nothing was written or sent.
    Unchanged,
    /// The edit was persisted and broadcast to `recipients` participants.
    Applied { recipients: usize },
}

/// Service for editing and deleting messages
#[derive(Clone)]
pub struct MessageService {
    policy: MutationPolicy,
    ports: MessagingPorts,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(ports: MessagingPorts, config: ChatConfig) -> Self {
        let policy = MutationPolicy::new(
            ports.messages.clone(),
            ports.users.clone(),
            ports.privileges.clone(),
            config,
        )
        .with_clock(ports.clock.clone());

        Self { policy, ports }
    }

    pub fn policy(&self) -> &MutationPolicy {
        &self.policy
    }

    /// Check whether `user_id` may edit `message_id`
    pub async fn can_edit(&self, message_id: &str, user_id: UserId) -> ChatResult<()> {
        self.policy.can_edit(message_id, user_id).await
    }

    /// Check whether `user_id` may delete `message_id`
    pub async fn can_delete(&self, message_id: &str, user_id: UserId) -> ChatResult<()> {
        self.policy.can_delete(message_id, user_id).await
    }

    /// Authorize and apply an edit.
    pub async fn edit(
        &self,
        user_id: UserId,
        message_id: &str,
        room_id: &str,
        content: &str,
    ) -> ChatResult<EditOutcome> {
        self.policy.can_edit(message_id, user_id).await?;
        self.edit_message(user_id, message_id, room_id, content).await
    }

    /// Apply an edit without consulting the policy.
    ///
    /// Callers are expected to have run [`Self::can_edit`] first.
    pub async fn edit_message(
        &self,
        user_id: UserId,
        message_id: &str,
        room_id: &str,
        content: &str,
    ) -> ChatResult<EditOutcome> {
        self.ports.validator.check_content(content).await?;

        let current = self
            .ports
            .messages
            .find(message_id)
            .await?
            .ok_or_else(|| ChatError::message_not_found(message_id))?;

        if current.room_id != room_id {
            debug!(message_id, room_id, stored_room = %current.room_id, "edit names the wrong room");
            return Err(ChatError::message_not_found(message_id));
        }

        if current.content == content {
            debug!(message_id, user_id, "edit content unchanged, skipping");
            return Ok(EditOutcome::Unchanged);
        }

        let patch = MessagePatch::new(content, self.ports.clock.now());
        let patch = self.ports.hook.transform(EDIT_FILTER_HOOK, patch).await?;
        if patch.is_blank() {
            return Err(ChatError::InvalidMessageContent);
        }

        self.ports.messages.apply_patch(message_id, &patch).await?;

        let recipients = self.broadcast_edit(user_id, message_id, room_id).await?;
        info!(message_id, user_id, room_id, recipients, "chat message edited");

        Ok(EditOutcome::Applied { recipients })
    }

    /// Authorize and delete a message.
    pub async fn delete(&self, user_id: UserId, message_id: &str) -> ChatResult<()> {
        self.policy.can_delete(message_id, user_id).await?;
        self.ports.messages.delete(message_id).await?;

        info!(message_id, user_id, "chat message deleted");
        Ok(())
    }

    async fn broadcast_edit(
        &self,
        user_id: UserId,
        message_id: &str,
        room_id: &str,
    ) -> ChatResult<usize> {
        let message_ids = [message_id.to_string()];
        let (participants, messages) = tokio::try_join!(
            self.ports.rooms.participants(room_id),
            self.ports
                .renderer
                .render_for_delivery(&message_ids, user_id, room_id),
        )?;

        let event = Arc::new(ChatEvent::MessageEdited {
            room_id: room_id.to_string(),
            messages,
        });

        // Deliveries are detached; the edit never waits on a recipient.
        for &recipient in &participants {
            let notifier = Arc::clone(&self.ports.notifier);
            let event = Arc::clone(&event);
            let message_id = message_id.to_string();

            tokio::spawn(async move {
                if let Err(error) = notifier.notify(recipient, &event).await {
                    warn!(recipient, message_id = %message_id, %error, "failed to deliver chat edit");
                }
            });
        }

        Ok(participants.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ActingUser, ChatMessage};
    use crate::ports::{MockContentValidator, MockMessageStore, MockNotifier, MockRoomDirectory};
    use crate::repositories::{InMemoryMessageStore, InMemoryRoomDirectory, InMemoryUserDirectory};
    use crate::types::{ContentError, DenialReason, CHAT_PRIVILEGE};
    use crate::utils::ManualClock;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashSet;
    use std::time::Duration as StdDuration;
    use tokio::sync::{Mutex, Notify};
    use tokio::time::timeout;

    const AUTHOR: UserId = 1;
    const PEER: UserId = 2;
    const LURKER: UserId = 3;

    #[derive(Default)]
    struct RecordingNotifier {
        delivered: Mutex<Vec<(UserId, ChatEvent)>>,
        changed: Notify,
        failing: HashSet<UserId>,
        hanging: HashSet<UserId>,
    }

    impl RecordingNotifier {
        fn failing_for(recipient: UserId) -> Self {
            Self {
                failing: HashSet::from([recipient]),
                ..Self::default()
            }
        }

        fn hanging_for(recipient: UserId) -> Self {
            Self {
                hanging: HashSet::from([recipient]),
                ..Self::default()
            }
        }

        /// Wait until `count` deliveries have landed.
        async fn wait_for(&self, count: usize) -> Vec<(UserId, ChatEvent)> {
            let waiting = async {
                loop {
                    {
                        let delivered = self.delivered.lock().await;
                        if delivered.len() >= count {
                            return delivered.clone();
                        }
                    }
                    self.changed.notified().await;
                }
            };

            timeout(StdDuration::from_secs(2), waiting)
                .await
                .expect("deliveries did not arrive in time")
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, recipient: UserId, event: &ChatEvent) -> ChatResult<()> {
            if self.hanging.contains(&recipient) {
                std::future::pending::<()>().await;
            }
            if self.failing.contains(&recipient) {
                return Err(ChatError::internal("socket closed"));
            }
            self.delivered.lock().await.push((recipient, event.clone()));
            self.changed.notify_one();
            Ok(())
        }
    }

    struct FailingHook;

    #[async_trait]
    impl EditHook for FailingHook {
        async fn transform(&self, hook: &str, _patch: MessagePatch) -> ChatResult<MessagePatch> {
            Err(ChatError::hook(format!("{hook} rejected the payload")))
        }
    }

    struct Harness {
        messages: InMemoryMessageStore,
        rooms: InMemoryRoomDirectory,
        notifier: Arc<RecordingNotifier>,
        clock: Arc<ManualClock>,
        service: MessageService,
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    async fn harness_with(
        notifier: RecordingNotifier,
        hook: Option<Arc<dyn EditHook>>,
        config: ChatConfig,
    ) -> Harness {
        let messages = InMemoryMessageStore::new();
        messages
            .insert(ChatMessage::new("r1", AUTHOR, "hello").with_id("m1").with_created_at(t0()))
            .await;

        let users = InMemoryUserDirectory::new();
        for user_id in [AUTHOR, PEER, LURKER] {
            users.upsert(ActingUser::member(user_id)).await;
            users.grant(user_id, CHAT_PRIVILEGE).await;
        }

        let rooms = InMemoryRoomDirectory::new();
        for user_id in [AUTHOR, PEER, LURKER] {
            rooms.join("r1", user_id).await;
        }

        let notifier = Arc::new(notifier);
        let clock = Arc::new(ManualClock::new(t0() + Duration::seconds(5)));

        let mut ports = MessagingPorts::new(
            Arc::new(messages.clone()),
            Arc::new(users.clone()),
            Arc::new(users),
            Arc::new(rooms.clone()),
            notifier.clone(),
            &config,
        )
        .with_clock(clock.clone());
        if let Some(hook) = hook {
            ports = ports.with_hook(hook);
        }

        Harness {
            messages,
            rooms,
            notifier,
            clock,
            service: MessageService::new(ports, config),
        }
    }

    async fn harness() -> Harness {
        harness_with(RecordingNotifier::default(), None, ChatConfig::default()).await
    }

    #[tokio::test]
    async fn test_edit_persists_and_notifies_every_participant() {
        let h = harness().await;

        let outcome = h.service.edit(AUTHOR, "m1", "r1", "hello there").await.unwrap();
        assert_eq!(outcome, EditOutcome::Applied { recipients: 3 });

        let stored = h.messages.find("m1").await.unwrap().unwrap();
        assert_eq!(stored.content, "hello there");
        assert_eq!(stored.edited_at, Some(h.clock.now()));

        let delivered = h.notifier.wait_for(3).await;
        let mut recipients: Vec<_> = delivered.iter().map(|(uid, _)| *uid).collect();
        recipients.sort_unstable();
        assert_eq!(recipients, vec![AUTHOR, PEER, LURKER]);

        for (_, event) in delivered.iter() {
            assert_eq!(event.name(), "event:chats.edit");
            assert_eq!(event.room_id(), "r1");
            let ChatEvent::MessageEdited { messages, .. } = event;
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].content, "hello there");
            assert_eq!(messages[0].from_uid, AUTHOR);
        }
    }

    #[tokio::test]
    async fn test_identical_content_is_a_no_op() {
        let h = harness().await;

        let outcome = h.service.edit_message(AUTHOR, "m1", "r1", "hello").await.unwrap();

        assert_eq!(outcome, EditOutcome::Unchanged);
        assert_eq!(h.messages.write_count().await, 0);
        assert!(h.notifier.delivered.lock().await.is_empty());
        assert!(h.messages.find("m1").await.unwrap().unwrap().edited_at.is_none());
    }

    #[tokio::test]
    async fn test_no_op_edit_touches_nothing_downstream() {
        let stored = ChatMessage::new("r1", AUTHOR, "same").with_id("m1");

        let mut messages = MockMessageStore::new();
        messages
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        messages.expect_apply_patch().times(0);

        let mut rooms = MockRoomDirectory::new();
        rooms.expect_participants().times(0);

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let mut validator = MockContentValidator::new();
        validator.expect_check_content().times(1).returning(|_| Ok(()));

        let users = Arc::new(InMemoryUserDirectory::new());
        let ports = MessagingPorts::new(
            Arc::new(messages),
            users.clone(),
            users,
            Arc::new(rooms),
            Arc::new(notifier),
            &ChatConfig::default(),
        )
        .with_validator(Arc::new(validator));
        let service = MessageService::new(ports, ChatConfig::default());

        let outcome = service.edit_message(AUTHOR, "m1", "r1", "same").await.unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_hook_can_rewrite_content() {
        let hook: Arc<dyn EditHook> = Arc::new(|mut patch: MessagePatch| {
            patch.content = patch.content.replace("darn", "****");
            patch
        });
        let h = harness_with(RecordingNotifier::default(), Some(hook), ChatConfig::default()).await;

        h.service.edit(AUTHOR, "m1", "r1", "darn it").await.unwrap();

        assert_eq!(h.messages.find("m1").await.unwrap().unwrap().content, "**** it");
        let delivered = h.notifier.wait_for(1).await;
        let ChatEvent::MessageEdited { messages, .. } = &delivered[0].1;
        assert_eq!(messages[0].content, "**** it");
    }

    #[tokio::test]
    async fn test_blank_after_hook_is_rejected_without_write() {
        let hook: Arc<dyn EditHook> = Arc::new(|mut patch: MessagePatch| {
            patch.content = "   ".to_string();
            patch
        });
        let h = harness_with(RecordingNotifier::default(), Some(hook), ChatConfig::default()).await;

        let error = h.service.edit(AUTHOR, "m1", "r1", "new words").await.unwrap_err();

        assert!(matches!(error, ChatError::InvalidMessageContent));
        assert_eq!(h.messages.write_count().await, 0);
        assert!(h.notifier.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_validator_error_is_propagated_unchanged() {
        let h = harness_with(
            RecordingNotifier::default(),
            None,
            ChatConfig {
                maximum_message_length: 5,
                ..ChatConfig::default()
            },
        )
        .await;

        let error = h.service.edit_message(AUTHOR, "m1", "r1", "far too long").await.unwrap_err();
        assert!(matches!(
            error,
            ChatError::Content(ContentError::TooLong { max_length: 5 })
        ));

        let error = h.service.edit_message(AUTHOR, "m1", "r1", "  ").await.unwrap_err();
        assert!(matches!(error, ChatError::Content(ContentError::Empty)));
        assert_eq!(h.messages.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_custom_validator_rejection_propagates() {
        let mut validator = MockContentValidator::new();
        validator.expect_check_content().returning(|_| {
            Err(ContentError::Rejected {
                reason: "link spam".to_string(),
            }
            .into())
        });

        let messages = Arc::new(InMemoryMessageStore::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let ports = MessagingPorts::new(
            messages.clone(),
            users.clone(),
            users,
            Arc::new(InMemoryRoomDirectory::new()),
            Arc::new(RecordingNotifier::default()),
            &ChatConfig::default(),
        )
        .with_validator(Arc::new(validator));
        let service = MessageService::new(ports, ChatConfig::default());

        let error = service.edit_message(AUTHOR, "m1", "r1", "buy now").await.unwrap_err();
        assert_eq!(error.code(), "content-rejected");
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_fail_the_edit() {
        let h = harness_with(RecordingNotifier::failing_for(PEER), None, ChatConfig::default()).await;

        let outcome = h.service.edit(AUTHOR, "m1", "r1", "still works").await.unwrap();

        assert_eq!(outcome, EditOutcome::Applied { recipients: 3 });
        let delivered = h.notifier.wait_for(2).await;
        let mut recipients: Vec<_> = delivered.iter().map(|(uid, _)| *uid).collect();
        recipients.sort_unstable();
        assert_eq!(recipients, vec![AUTHOR, LURKER]);
    }

    #[tokio::test]
    async fn test_participants_are_read_at_edit_time() {
        let h = harness().await;
        h.rooms.leave("r1", LURKER).await;

        let outcome = h.service.edit(AUTHOR, "m1", "r1", "after leave").await.unwrap();

        assert_eq!(outcome, EditOutcome::Applied { recipients: 2 });
        let delivered = h.notifier.wait_for(2).await;
        assert!(delivered.iter().all(|(uid, _)| *uid != LURKER));
    }

    #[tokio::test]
    async fn test_edit_does_not_wait_for_stalled_recipient() {
        let h = harness_with(RecordingNotifier::hanging_for(PEER), None, ChatConfig::default()).await;

        let outcome = timeout(
            StdDuration::from_secs(2),
            h.service.edit(AUTHOR, "m1", "r1", "changed"),
        )
        .await
        .expect("edit should return while a delivery is stalled")
        .unwrap();

        assert_eq!(outcome, EditOutcome::Applied { recipients: 3 });
        assert_eq!(h.messages.find("m1").await.unwrap().unwrap().content, "changed");

        let delivered = h.notifier.wait_for(2).await;
        let mut recipients: Vec<_> = delivered.iter().map(|(uid, _)| *uid).collect();
        recipients.sort_unstable();
        assert_eq!(recipients, vec![AUTHOR, LURKER]);
    }

    #[tokio::test]
    async fn test_hook_error_reaches_caller_without_write() {
        let h = harness_with(
            RecordingNotifier::default(),
            Some(Arc::new(FailingHook)),
            ChatConfig::default(),
        )
        .await;

        let error = h.service.edit(AUTHOR, "m1", "r1", "new words").await.unwrap_err();

        assert!(matches!(error, ChatError::Hook { ref message } if message.contains(EDIT_FILTER_HOOK)));
        assert_eq!(error.code(), "hook-error");
        assert_eq!(h.messages.write_count().await, 0);
        assert!(h.notifier.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_edit_naming_another_room_is_rejected_before_write() {
        let h = harness().await;
        h.rooms.join("r2", PEER).await;

        let error = h.service.edit(AUTHOR, "m1", "r2", "moved?").await.unwrap_err();

        assert_eq!(error.code(), "invalid-message");
        assert_eq!(h.messages.write_count().await, 0);
        assert_eq!(h.messages.find("m1").await.unwrap().unwrap().content, "hello");
        assert!(h.notifier.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_message_is_an_error() {
        let h = harness().await;

        let error = h.service.edit_message(AUTHOR, "gone", "r1", "text").await.unwrap_err();

        assert!(matches!(error, ChatError::MessageNotFound { ref id } if id == "gone"));
    }

    #[tokio::test]
    async fn test_edit_by_non_owner_is_denied_before_any_write() {
        let h = harness().await;

        let error = h.service.edit(PEER, "m1", "r1", "hijack").await.unwrap_err();

        assert_eq!(
            error.denial(),
            Some(&DenialReason::CannotMutate {
                action: crate::types::MutationAction::Edit,
            })
        );
        assert_eq!(h.messages.write_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_respects_window() {
        let h = harness_with(
            RecordingNotifier::default(),
            None,
            ChatConfig {
                delete_duration_seconds: 10,
                ..ChatConfig::default()
            },
        )
        .await;

        h.clock.set(t0() + Duration::seconds(11));
        let error = h.service.delete(AUTHOR, "m1").await.unwrap_err();
        assert_eq!(error.code(), "mutation-duration-expired");
        assert!(h.messages.exists("m1").await.unwrap());

        h.clock.set(t0() + Duration::seconds(10));
        h.service.delete(AUTHOR, "m1").await.unwrap();
        assert!(!h.messages.exists("m1").await.unwrap());
    }
}
