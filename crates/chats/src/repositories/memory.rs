//! In-memory repository implementations for tests and embedding.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entities::{ActingUser, ChatMessage, MessagePatch};
use crate::ports::{MessageStore, PrivilegeStore, RoomDirectory, UserDirectory};
use crate::types::{ChatError, ChatResult, UserId};

/// In-memory message store
#[derive(Clone, Default)]
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<HashMap<String, ChatMessage>>>,
    writes: Arc<RwLock<usize>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, message: ChatMessage) {
        let mut messages = self.messages.write().await;
        messages.insert(message.id.clone(), message);
    }

    /// Number of patches applied since creation
    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn exists(&self, message_id: &str) -> ChatResult<bool> {
        let messages = self.messages.read().await;
        Ok(messages.contains_key(message_id))
    }

    async fn find(&self, message_id: &str) -> ChatResult<Option<ChatMessage>> {
        let messages = self.messages.read().await;
        Ok(messages.get(message_id).cloned())
    }

    async fn apply_patch(&self, message_id: &str, patch: &MessagePatch) -> ChatResult<()> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(message_id)
            .ok_or_else(|| ChatError::message_not_found(message_id))?;
        message.apply(patch);

        let mut writes = self.writes.write().await;
        *writes += 1;
        Ok(())
    }

    async fn delete(&self, message_id: &str) -> ChatResult<()> {
        let mut messages = self.messages.write().await;
        messages
            .remove(message_id)
            .map(|_| ())
            .ok_or_else(|| ChatError::message_not_found(message_id))
    }
}

/// In-memory user directory that also answers global privilege checks
#[derive(Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, ActingUser>>>,
    privileges: Arc<RwLock<HashMap<UserId, HashSet<String>>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, user: ActingUser) {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
    }

    pub async fn grant(&self, user_id: UserId, privilege: &str) {
        let mut privileges = self.privileges.write().await;
        privileges
            .entry(user_id)
            .or_default()
            .insert(privilege.to_string());
    }

    pub async fn revoke(&self, user_id: UserId, privilege: &str) {
        let mut privileges = self.privileges.write().await;
        if let Some(granted) = privileges.get_mut(&user_id) {
            granted.remove(privilege);
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn acting_user(&self, user_id: UserId) -> ChatResult<ActingUser> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| ActingUser::member(user_id)))
    }
}

#[async_trait]
impl PrivilegeStore for InMemoryUserDirectory {
    async fn can_global(&self, privilege: &str, user_id: UserId) -> ChatResult<bool> {
        let privileges = self.privileges.read().await;
        Ok(privileges
            .get(&user_id)
            .is_some_and(|granted| granted.contains(privilege)))
    }
}

/// In-memory room membership
#[derive(Clone, Default)]
pub struct InMemoryRoomDirectory {
    rooms: Arc<RwLock<HashMap<String, BTreeSet<UserId>>>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join(&self, room_id: &str, user_id: UserId) {
        let mut rooms = self.rooms.write().await;
        rooms.entry(room_id.to_string()).or_default().insert(user_id);
    }

    pub async fn leave(&self, room_id: &str, user_id: UserId) {
        let mut rooms = self.rooms.write().await;
        if let Some(members) = rooms.get_mut(room_id) {
            members.remove(&user_id);
        }
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn participants(&self, room_id: &str) -> ChatResult<Vec<UserId>> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default())
    }
}
