//! Chats, messages, membership, and read receipts.

use crate::error::{AppError, AppResult};
use crate::models::message::MESSAGE_VIEW_COLUMNS;
use crate::models::{Chat, ChatView, MessageView, NotificationKind, NotificationRef, UserProfile};
use crate::services::{IdentityService, NotificationWriter};
use sqlx::PgPool;
use uuid::Uuid;

const CHAT_COLUMNS: &str = "id, title, is_group, created_by, last_message_id, user_a, user_b, \
                            created_at, updated_at";

/// Order a direct-chat participant pair so the pair key is canonical.
pub fn direct_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Validate an add-users batch against current membership. The first invalid
/// candidate fails the whole batch; nothing is persisted by the caller in
/// that case. Lookup results arrive as plain values so a shared mutable flag
/// never exists.
pub fn check_candidates(
    current_members: &[Uuid],
    candidates: &[(Uuid, bool)],
) -> Result<Vec<Uuid>, AppError> {
    let mut accepted: Vec<Uuid> = Vec::with_capacity(candidates.len());
    for (id, exists) in candidates {
        if !exists {
            return Err(AppError::Forbidden(format!("user {id} is not found")));
        }
        if current_members.contains(id) || accepted.contains(id) {
            return Err(AppError::Forbidden(format!(
                "user {id} is already in the chat"
            )));
        }
        accepted.push(*id);
    }
    Ok(accepted)
}

#[derive(Clone)]
pub struct ConversationService {
    pool: PgPool,
    identity: IdentityService,
}

impl ConversationService {
    pub fn new(pool: PgPool) -> Self {
        let identity = IdentityService::new(pool.clone());
        Self { pool, identity }
    }

    async fn chat_row(&self, id: Uuid) -> AppResult<Option<Chat>> {
        let chat =
            sqlx::query_as::<_, Chat>(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(chat)
    }

    async fn members_of(&self, chat_id: Uuid) -> AppResult<Vec<Uuid>> {
        let members: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM chat_members WHERE chat_id = $1 ORDER BY joined_at",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn is_member(&self, chat_id: Uuid, user: Uuid) -> AppResult<bool> {
        let member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM chat_members WHERE chat_id = $1 AND user_id = $2)",
        )
        .bind(chat_id)
        .bind(user)
        .fetch_one(&self.pool)
        .await?;
        Ok(member)
    }

    /// Fetch a chat for a member. Non-members get `NotFound` rather than
    /// `Forbidden` so the chat's existence is not leaked.
    async fn member_chat(&self, chat_id: Uuid, user: Uuid) -> AppResult<Chat> {
        let chat = self
            .chat_row(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("chat not found".into()))?;
        if !self.is_member(chat_id, user).await? {
            return Err(AppError::NotFound("chat not found".into()));
        }
        Ok(chat)
    }

    /// Find or create the direct chat for `{actor, peer}`, idempotently
    /// keyed by the ordered pair.
    pub async fn start_or_get_direct_chat(&self, actor: Uuid, peer: Uuid) -> AppResult<Chat> {
        if actor == peer {
            return Err(AppError::SelfReference(
                "you can't start a conversation with yourself".into(),
            ));
        }
        if !self.identity.user_exists(peer).await? {
            return Err(AppError::NotFound("user not found".into()));
        }

        let (a, b) = direct_pair(actor, peer);

        let existing = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE NOT is_group AND user_a = $1 AND user_b = $2"
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(chat) = existing {
            return Ok(chat);
        }

        let mut tx = self.pool.begin().await?;

        // A concurrent creator wins the pair index; re-read below either way.
        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO chats (id, is_group, created_by, user_a, user_b)
            VALUES ($1, FALSE, $2, $3, $4)
            ON CONFLICT (user_a, user_b) WHERE NOT is_group DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor)
        .bind(a)
        .bind(b)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(chat_id) = inserted {
            sqlx::query(
                r#"
                INSERT INTO chat_members (chat_id, user_id)
                VALUES ($1, $2), ($1, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(chat_id)
            .bind(a)
            .bind(b)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let chat = sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE NOT is_group AND user_a = $1 AND user_b = $2"
        ))
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(chat)
    }

    /// Send into an existing chat, or lazily create the direct chat when the
    /// target id names a user instead.
    pub async fn send_to_target(
        &self,
        actor: Uuid,
        target: Uuid,
        content: &str,
    ) -> AppResult<MessageView> {
        let chat = match self.chat_row(target).await? {
            Some(chat) => {
                if !self.is_member(target, actor).await? {
                    return Err(AppError::NotFound("chat not found".into()));
                }
                chat
            }
            None => self.start_or_get_direct_chat(actor, target).await?,
        };

        self.send_message(actor, chat.id, content).await
    }

    /// Append a message. One transaction covers the message, the sender's
    /// read receipt, the chat bump, and the fan-out to other members.
    pub async fn send_message(
        &self,
        actor: Uuid,
        chat_id: Uuid,
        content: &str,
    ) -> AppResult<MessageView> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("a message needs content".into()));
        }

        let recipients: Vec<Uuid> = self
            .members_of(chat_id)
            .await?
            .into_iter()
            .filter(|&m| m != actor)
            .collect();

        let mut tx = self.pool.begin().await?;

        let message_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(chat_id)
        .bind(actor)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO message_reads (message_id, user_id) VALUES ($1, $2)")
            .bind(message_id)
            .bind(actor)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE chats SET last_message_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .bind(message_id)
            .execute(&mut *tx)
            .await?;

        NotificationWriter::notify_many(
            &mut tx,
            actor,
            &recipients,
            NotificationKind::NewMessage,
            Some(NotificationRef::Chat(chat_id)),
        )
        .await?;

        tx.commit().await?;

        self.message_view(message_id)
            .await?
            .ok_or(AppError::Internal)
    }

    /// Create a group chat with `members ∪ {actor}` and notify everyone else.
    pub async fn create_group_chat(
        &self,
        actor: Uuid,
        member_ids: Vec<Uuid>,
        title: Option<String>,
    ) -> AppResult<ChatView> {
        let mut members = member_ids;
        members.push(actor);
        members.sort();
        members.dedup();

        let checks = self.lookup_users(&members).await?;
        for (id, exists) in &checks {
            if !exists {
                return Err(AppError::NotFound(format!("user {id} is not found")));
            }
        }

        let mut tx = self.pool.begin().await?;

        let chat_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO chats (id, title, is_group, created_by)
            VALUES ($1, $2, TRUE, $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        for member in &members {
            sqlx::query("INSERT INTO chat_members (chat_id, user_id) VALUES ($1, $2)")
                .bind(chat_id)
                .bind(member)
                .execute(&mut *tx)
                .await?;
        }

        let recipients: Vec<Uuid> = members.iter().copied().filter(|&m| m != actor).collect();
        NotificationWriter::notify_many(
            &mut tx,
            actor,
            &recipients,
            NotificationKind::AddedToChat,
            Some(NotificationRef::Chat(chat_id)),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(%chat_id, %actor, members = members.len(), "group chat created");

        self.get_chat_view(chat_id).await
    }

    /// Add users to a chat. Candidate lookups run concurrently; the first
    /// invalid entry aborts the whole batch before anything is persisted.
    pub async fn add_users(
        &self,
        actor: Uuid,
        chat_id: Uuid,
        new_user_ids: Vec<Uuid>,
    ) -> AppResult<ChatView> {
        self.member_chat(chat_id, actor).await?;

        let current = self.members_of(chat_id).await?;
        let checks = self.lookup_users(&new_user_ids).await?;
        let accepted = check_candidates(&current, &checks)?;

        let mut tx = self.pool.begin().await?;

        for member in &accepted {
            sqlx::query("INSERT INTO chat_members (chat_id, user_id) VALUES ($1, $2)")
                .bind(chat_id)
                .bind(member)
                .execute(&mut *tx)
                .await?;
        }

        NotificationWriter::notify_many(
            &mut tx,
            actor,
            &accepted,
            NotificationKind::AddedToChat,
            Some(NotificationRef::Chat(chat_id)),
        )
        .await?;

        tx.commit().await?;

        self.get_chat_view(chat_id).await
    }

    /// Existence lookups for a candidate batch. Lookups are independent and
    /// all run to completion; a failure in one does not cancel its siblings.
    async fn lookup_users(&self, ids: &[Uuid]) -> AppResult<Vec<(Uuid, bool)>> {
        let lookups = ids.iter().map(|&id| {
            let identity = self.identity.clone();
            async move { (id, identity.user_exists(id).await) }
        });

        let mut checks = Vec::with_capacity(ids.len());
        for (id, result) in futures::future::join_all(lookups).await {
            checks.push((id, result?));
        }
        Ok(checks)
    }

    /// Remove the actor from a chat and tell the chat's creator.
    pub async fn leave_chat(&self, actor: Uuid, chat_id: Uuid) -> AppResult<ChatView> {
        let chat = self
            .chat_row(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("chat not found".into()))?;
        if !self.is_member(chat_id, actor).await? {
            return Err(AppError::NotFound("user is not part of this chat".into()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chat_members WHERE chat_id = $1 AND user_id = $2")
            .bind(chat_id)
            .bind(actor)
            .execute(&mut *tx)
            .await?;

        NotificationWriter::notify(
            &mut tx,
            actor,
            chat.created_by,
            NotificationKind::LeftChat,
            Some(NotificationRef::Chat(chat_id)),
        )
        .await?;

        tx.commit().await?;
        tracing::info!(%chat_id, %actor, "member left chat");

        self.get_chat_view(chat_id).await
    }

    /// Soft delete, reserved to the sender. Content is retained server-side.
    pub async fn delete_message(&self, actor: Uuid, message_id: Uuid) -> AppResult<MessageView> {
        let message = self
            .message_view(message_id)
            .await?
            .ok_or_else(|| AppError::NotFound("message not found".into()))?;
        if message.sender_id != actor {
            return Err(AppError::Forbidden(
                "can only delete your own messages".into(),
            ));
        }

        sqlx::query("UPDATE messages SET removed = TRUE WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        self.message_view(message_id)
            .await?
            .ok_or(AppError::Internal)
    }

    /// Retitle a chat, reserved to its creator.
    pub async fn update_chat_title(
        &self,
        actor: Uuid,
        chat_id: Uuid,
        title: &str,
    ) -> AppResult<ChatView> {
        let chat = self
            .chat_row(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("chat not found".into()))?;
        if chat.created_by != actor {
            return Err(AppError::Forbidden(
                "can't update chat title, only chat admin".into(),
            ));
        }

        sqlx::query("UPDATE chats SET title = $2, updated_at = NOW() WHERE id = $1")
            .bind(chat_id)
            .bind(title)
            .execute(&self.pool)
            .await?;

        self.get_chat_view(chat_id).await
    }

    /// Fetch a chat for a member. Side effect: every message in the chat
    /// gains a read receipt for the actor.
    pub async fn get_chat(&self, actor: Uuid, chat_id: Uuid) -> AppResult<ChatView> {
        self.member_chat(chat_id, actor).await?;

        sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id)
            SELECT id, $2 FROM messages WHERE chat_id = $1
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(chat_id)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        self.get_chat_view(chat_id).await
    }

    /// Last message of a chat. Unlike `get_chat`, a non-member gets an
    /// explicit `Forbidden` here.
    pub async fn get_last_message(
        &self,
        actor: Uuid,
        chat_id: Uuid,
    ) -> AppResult<Option<MessageView>> {
        let chat = self
            .chat_row(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("chat not found".into()))?;
        if !self.is_member(chat_id, actor).await? {
            return Err(AppError::Forbidden(
                "user is not a member of this chat".into(),
            ));
        }

        match chat.last_message_id {
            Some(id) => self.message_view(id).await,
            None => Ok(None),
        }
    }

    pub async fn message_view(&self, id: Uuid) -> AppResult<Option<MessageView>> {
        let message = sqlx::query_as::<_, MessageView>(&format!(
            "SELECT {MESSAGE_VIEW_COLUMNS} FROM messages m WHERE m.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    /// Assemble the full view: member profiles plus last-message preview.
    pub async fn get_chat_view(&self, chat_id: Uuid) -> AppResult<ChatView> {
        let chat = self
            .chat_row(chat_id)
            .await?
            .ok_or_else(|| AppError::NotFound("chat not found".into()))?;

        let users = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name, u.profile_image,
                   u.cover_image, u.closed, u.created_at
            FROM users u
            JOIN chat_members cm ON cm.user_id = u.id
            WHERE cm.chat_id = $1
            ORDER BY cm.joined_at
            "#,
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await?;

        let last_message = match chat.last_message_id {
            Some(id) => self.message_view(id).await?,
            None => None,
        };

        Ok(ChatView {
            id: chat.id,
            title: chat.title,
            is_group: chat.is_group,
            created_by: chat.created_by,
            users,
            last_message,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_pair_is_order_insensitive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(direct_pair(a, b), direct_pair(b, a));
        let (lo, hi) = direct_pair(a, b);
        assert!(lo <= hi);
    }

    #[test]
    fn candidates_all_valid_are_accepted_in_order() {
        let existing = [Uuid::new_v4()];
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let accepted = check_candidates(&existing, &[(c1, true), (c2, true)]).unwrap();
        assert_eq!(accepted, vec![c1, c2]);
    }

    #[test]
    fn unknown_user_fails_the_whole_batch() {
        let good = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let err = check_candidates(&[], &[(good, true), (missing, false)]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("not found")));
    }

    #[test]
    fn existing_member_fails_the_whole_batch() {
        let member = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        let err = check_candidates(&[member], &[(newcomer, true), (member, true)]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m.contains("already in the chat")));
    }

    #[test]
    fn duplicate_within_batch_is_rejected() {
        let id = Uuid::new_v4();
        let err = check_candidates(&[], &[(id, true), (id, true)]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
