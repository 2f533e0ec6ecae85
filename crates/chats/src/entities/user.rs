use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Role and standing facts about the user requesting a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActingUser {
    pub id: UserId,
    pub is_admin: bool,
    pub is_global_moderator: bool,
    pub banned: bool,
}

impl ActingUser {
    /// An ordinary user in good standing
    pub fn member(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
            is_global_moderator: false,
            banned: false,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Self {
            is_admin: true,
            ..Self::member(id)
        }
    }

    pub fn global_moderator(id: UserId) -> Self {
        Self {
            is_global_moderator: true,
            ..Self::member(id)
        }
    }

    pub fn banned(mut self) -> Self {
        self.banned = true;
        self
    }

    /// Administrators and global moderators
    pub fn is_elevated(&self) -> bool {
        self.is_admin || self.is_global_moderator
    }
}
