//! Per-user broadcast channels used to push chat events to live connections.
//!
//! Each connected user gets a `tokio::sync::broadcast` channel; every socket
//! the user has open subscribes to it. Sending to a user with no live
//! subscriber is not an error, the event is simply dropped.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

use crate::ports::Notifier;
use crate::types::{ChatEvent, ChatResult, UserId};

const CHANNEL_CAPACITY: usize = 100;

#[derive(Clone)]
pub struct UserChannels {
    connections: Arc<RwLock<HashMap<UserId, broadcast::Sender<ChatEvent>>>>,
    capacity: usize,
}

impl UserChannels {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Get or create the broadcaster for a specific user
    pub async fn sender(&self, user_id: UserId) -> broadcast::Sender<ChatEvent> {
        let mut connections = self.connections.write().await;
        connections
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Open a new receiving end for `user_id`
    pub async fn subscribe(&self, user_id: UserId) -> broadcast::Receiver<ChatEvent> {
        self.sender(user_id).await.subscribe()
    }

    /// Drop channels that no longer have any subscriber
    pub async fn prune(&self) {
        let mut connections = self.connections.write().await;
        connections.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for UserChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for UserChannels {
    async fn notify(&self, recipient: UserId, event: &ChatEvent) -> ChatResult<()> {
        let sender = {
            let connections = self.connections.read().await;
            connections.get(&recipient).cloned()
        };

        match sender.map(|sender| sender.send(event.clone())) {
            Some(Ok(receivers)) => {
                trace!(recipient, receivers, event = event.name(), "event delivered");
            }
            _ => {
                trace!(recipient, event = event.name(), "no live connection for recipient");
            }
        }

        Ok(())
    }
}
