use crate::models::message::MessageView;
use crate::models::user::UserProfile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A conversation. Direct chats hold their ordered participant pair in
/// `(user_a, user_b)` with `user_a < user_b`; a partial unique index over the
/// pair makes find-or-create idempotent. Group chats leave the pair unset.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Chat {
    pub id: Uuid,
    pub title: Option<String>,
    pub is_group: bool,
    pub created_by: Uuid,
    pub last_message_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub user_a: Option<Uuid>,
    #[serde(skip_serializing)]
    pub user_b: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat with member profiles and last-message preview populated.
#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub id: Uuid,
    pub title: Option<String>,
    pub is_group: bool,
    pub created_by: Uuid,
    pub users: Vec<UserProfile>,
    pub last_message: Option<MessageView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
