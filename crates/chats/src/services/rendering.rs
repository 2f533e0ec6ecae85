use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::entities::RenderedMessage;
use crate::ports::{MessageRenderer, MessageStore};
use crate::types::{ChatResult, MessageId, UserId};

/// Renders messages straight from the message store.
///
/// Ids that no longer resolve, or that belong to another room, are skipped.
#[derive(Clone)]
pub struct StoredMessageRenderer {
    messages: Arc<dyn MessageStore>,
}

impl StoredMessageRenderer {
    pub fn new(messages: Arc<dyn MessageStore>) -> Self {
        Self { messages }
    }
}

#[async_trait]
impl MessageRenderer for StoredMessageRenderer {
    async fn render_for_delivery(
        &self,
        message_ids: &[MessageId],
        viewer: UserId,
        room_id: &str,
    ) -> ChatResult<Vec<RenderedMessage>> {
        let mut rendered = Vec::with_capacity(message_ids.len());

        for message_id in message_ids {
            match self.messages.find(message_id).await? {
                Some(message) if message.room_id == room_id => {
                    rendered.push(RenderedMessage::from_message(&message, viewer));
                }
                _ => debug!(message_id = %message_id, room_id, "skipping unrenderable message"),
            }
        }

        Ok(rendered)
    }
}
