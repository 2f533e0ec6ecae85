//! SQLite-backed user standing and global privilege lookups.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::entities::ActingUser;
use crate::ports::{PrivilegeStore, UserDirectory};
use crate::types::{ChatResult, UserId};

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the role and ban facts for a user
    pub async fn upsert(&self, user: &ActingUser) -> ChatResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, is_admin, is_global_moderator, banned)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                is_admin = excluded.is_admin,
                is_global_moderator = excluded.is_global_moderator,
                banned = excluded.banned
            "#,
        )
        .bind(user.id)
        .bind(user.is_admin)
        .bind(user.is_global_moderator)
        .bind(user.banned)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn grant(&self, user_id: UserId, privilege: &str) -> ChatResult<()> {
        sqlx::query("INSERT OR IGNORE INTO global_privileges (user_id, privilege) VALUES (?, ?)")
            .bind(user_id)
            .bind(privilege)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn revoke(&self, user_id: UserId, privilege: &str) -> ChatResult<()> {
        sqlx::query("DELETE FROM global_privileges WHERE user_id = ? AND privilege = ?")
            .bind(user_id)
            .bind(privilege)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserRepository {
    async fn acting_user(&self, user_id: UserId) -> ChatResult<ActingUser> {
        let user = sqlx::query_as::<_, ActingUser>(
            "SELECT id, is_admin, is_global_moderator, banned FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user.unwrap_or_else(|| ActingUser::member(user_id)))
    }
}

#[async_trait]
impl PrivilegeStore for SqliteUserRepository {
    async fn can_global(&self, privilege: &str, user_id: UserId) -> ChatResult<bool> {
        let granted: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM global_privileges WHERE user_id = ? AND privilege = ?",
        )
        .bind(user_id)
        .bind(privilege)
        .fetch_optional(&self.pool)
        .await?;

        Ok(granted.is_some())
    }
}
