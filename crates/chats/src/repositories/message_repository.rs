//! SQLite-backed message store.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::entities::{ChatMessage, MessagePatch};
use crate::ports::MessageStore;
use crate::types::{ChatError, ChatResult};

/// Repository for message database operations
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new message. Message creation itself is owned elsewhere; this
    /// exists for seeding and tests.
    pub async fn insert(&self, message: &ChatMessage) -> ChatResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, room_id, author_id, content, system, created_at, edited_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.room_id)
        .bind(message.author_id)
        .bind(&message.content)
        .bind(message.system)
        .bind(message.created_at)
        .bind(message.edited_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MessageStore for SqliteMessageRepository {
    async fn exists(&self, message_id: &str) -> ChatResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM messages WHERE id = ?")
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    async fn find(&self, message_id: &str) -> ChatResult<Option<ChatMessage>> {
        let message = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, room_id, author_id, content, system, created_at, edited_at
            FROM messages
            WHERE id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn apply_patch(&self, message_id: &str, patch: &MessagePatch) -> ChatResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET content = ?, edited_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.content)
        .bind(patch.edited_at)
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ChatError::message_not_found(message_id));
        }

        Ok(())
    }

    async fn delete(&self, message_id: &str) -> ChatResult<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ChatError::message_not_found(message_id));
        }

        Ok(())
    }
}
