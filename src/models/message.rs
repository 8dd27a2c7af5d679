use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Message plus its read-receipt set. The sender's receipt is written in the
/// same transaction as the message, so `sender_id ∈ read_by` always holds.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MessageView {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub removed: bool,
    pub read_by: Vec<Uuid>,
    pub posted_at: DateTime<Utc>,
}

/// Select list producing a [`MessageView`] from a `messages m` row.
pub const MESSAGE_VIEW_COLUMNS: &str = r#"
    m.id, m.chat_id, m.sender_id, m.content, m.removed,
    ARRAY(SELECT r.user_id FROM message_reads r
          WHERE r.message_id = m.id ORDER BY r.read_at) AS read_by,
    m.posted_at
"#;
