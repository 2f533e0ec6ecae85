use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::ports::RoomDirectory;
use crate::types::{ChatResult, UserId};

/// Room participant lookups backed by SQLite
#[derive(Clone)]
pub struct SqliteRoomRepository {
    pool: SqlitePool,
}

impl SqliteRoomRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn join(&self, room_id: &str, user_id: UserId) -> ChatResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO room_participants (room_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(room_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn leave(&self, room_id: &str, user_id: UserId) -> ChatResult<()> {
        sqlx::query("DELETE FROM room_participants WHERE room_id = ? AND user_id = ?")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl RoomDirectory for SqliteRoomRepository {
    async fn participants(&self, room_id: &str) -> ChatResult<Vec<UserId>> {
        let user_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id FROM room_participants
            WHERE room_id = ?
            ORDER BY user_id ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(user_ids)
    }
}
