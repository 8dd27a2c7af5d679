//! Unread aggregation across chats, messages, and notifications.

use crate::error::{AppError, AppResult};
use crate::models::message::MESSAGE_VIEW_COLUMNS;
use crate::models::post::POST_VIEW_COLUMNS;
use crate::models::{
    ChatView, MessageView, Notification, NotificationRef, PostView, ResolvedNotification,
};
use crate::services::ConversationService;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct UnreadMessages {
    pub count: usize,
    pub messages: Vec<MessageView>,
}

#[derive(Clone)]
pub struct ReadStateService {
    pool: PgPool,
    conversations: ConversationService,
}

impl ReadStateService {
    pub fn new(pool: PgPool) -> Self {
        let conversations = ConversationService::new(pool.clone());
        Self {
            pool,
            conversations,
        }
    }

    /// All chats the actor belongs to, most recently updated first.
    pub async fn inbox(&self, actor: Uuid) -> AppResult<Vec<ChatView>> {
        let chat_ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT c.id FROM chats c
            JOIN chat_members cm ON cm.chat_id = c.id
            WHERE cm.user_id = $1
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(actor)
        .fetch_all(&self.pool)
        .await?;

        let mut inbox = Vec::with_capacity(chat_ids.len());
        for id in chat_ids {
            inbox.push(self.conversations.get_chat_view(id).await?);
        }
        Ok(inbox)
    }

    /// Messages across the actor's chats with no read receipt from the
    /// actor. Soft-deleted messages are excluded.
    pub async fn unread_messages(&self, actor: Uuid) -> AppResult<UnreadMessages> {
        let messages = sqlx::query_as::<_, MessageView>(&format!(
            r#"
            SELECT {MESSAGE_VIEW_COLUMNS} FROM messages m
            JOIN chat_members cm ON cm.chat_id = m.chat_id AND cm.user_id = $1
            WHERE NOT m.removed
              AND NOT EXISTS (
                  SELECT 1 FROM message_reads r
                  WHERE r.message_id = m.id AND r.user_id = $1
              )
            ORDER BY m.posted_at DESC
            "#
        ))
        .bind(actor)
        .fetch_all(&self.pool)
        .await?;

        Ok(UnreadMessages {
            count: messages.len(),
            messages,
        })
    }

    /// Unopened notifications for the actor, each dereferenced according to
    /// its kind. A referent that fails to load degrades to the raw
    /// reference, never a failure.
    pub async fn unread_notifications(&self, actor: Uuid) -> AppResult<Vec<ResolvedNotification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, from_user, to_user, kind, post_id, chat_id, opened, created_at
            FROM notifications
            WHERE to_user = $1 AND NOT opened
            ORDER BY created_at DESC
            "#,
        )
        .bind(actor)
        .fetch_all(&self.pool)
        .await?;

        let mut resolved = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let instance = self.resolve(&notification).await?;
            resolved.push(ResolvedNotification {
                notification,
                instance,
            });
        }
        Ok(resolved)
    }

    async fn resolve(&self, notification: &Notification) -> AppResult<Option<serde_json::Value>> {
        let Some(reference) = notification.reference() else {
            return Ok(None);
        };

        let loaded = match reference {
            NotificationRef::Post(id) => {
                let post = sqlx::query_as::<_, PostView>(&format!(
                    "SELECT {POST_VIEW_COLUMNS} FROM posts p WHERE p.id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
                post.map(|p| serde_json::to_value(p).map_err(|_| AppError::Internal))
                    .transpose()?
            }
            NotificationRef::Chat(id) => match self.conversations.get_chat_view(id).await {
                Ok(chat) => Some(serde_json::to_value(chat).map_err(|_| AppError::Internal)?),
                Err(AppError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
        };

        match loaded {
            Some(value) => Ok(Some(value)),
            // Referent gone: hand back the raw reference instead of nothing.
            None => Ok(Some(
                serde_json::to_value(reference).map_err(|_| AppError::Internal)?,
            )),
        }
    }

    /// Mark one notification opened. Scoped to the recipient, so the
    /// transition cannot be forged by anyone else.
    pub async fn open_notification(&self, actor: Uuid, id: Uuid) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET opened = TRUE
            WHERE id = $1 AND to_user = $2
            RETURNING id, from_user, to_user, kind, post_id, chat_id, opened, created_at
            "#,
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("notification not found".into()))
    }
}
