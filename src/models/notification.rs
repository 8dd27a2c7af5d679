use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Event kinds in the append-only notification log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Follow,
    NewMessage,
    Retweet,
    LeftChat,
    Comment,
    AddedToChat,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "like",
            NotificationKind::Follow => "follow",
            NotificationKind::NewMessage => "new_message",
            NotificationKind::Retweet => "retweet",
            NotificationKind::LeftChat => "left_chat",
            NotificationKind::Comment => "comment",
            NotificationKind::AddedToChat => "added_to_chat",
        }
    }
}

/// The referent a notification points at, tagged by kind rather than
/// reinterpreted by convention. Serializes externally tagged, e.g.
/// `{"post": "<id>"}`, which is the wire shape of an unresolved reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationRef {
    Post(Uuid),
    Chat(Uuid),
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub kind: NotificationKind,
    #[serde(skip_serializing)]
    pub post_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub chat_id: Option<Uuid>,
    pub opened: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Dispatches the opaque instance columns into a typed referent.
    /// Kinds without a mapped referent (e.g. `follow`) resolve to `None`.
    pub fn reference(&self) -> Option<NotificationRef> {
        match self.kind {
            NotificationKind::Like | NotificationKind::Comment | NotificationKind::Retweet => {
                self.post_id.map(NotificationRef::Post)
            }
            NotificationKind::NewMessage
            | NotificationKind::AddedToChat
            | NotificationKind::LeftChat => self.chat_id.map(NotificationRef::Chat),
            NotificationKind::Follow => None,
        }
    }
}

/// Notification with its referent dereferenced for the recipient. A referent
/// that no longer loads degrades to the raw [`NotificationRef`] in
/// `instance`; only kinds without any referent leave it empty.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNotification {
    #[serde(flatten)]
    pub notification: Notification,
    pub instance: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notification(kind: NotificationKind, post: Option<Uuid>, chat: Option<Uuid>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            from_user: Uuid::new_v4(),
            to_user: Uuid::new_v4(),
            kind,
            post_id: post,
            chat_id: chat,
            opened: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn content_kinds_reference_posts() {
        let post = Uuid::new_v4();
        for kind in [
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Retweet,
        ] {
            let n = notification(kind, Some(post), None);
            assert_eq!(n.reference(), Some(NotificationRef::Post(post)));
        }
    }

    #[test]
    fn conversation_kinds_reference_chats() {
        let chat = Uuid::new_v4();
        for kind in [
            NotificationKind::NewMessage,
            NotificationKind::AddedToChat,
            NotificationKind::LeftChat,
        ] {
            let n = notification(kind, None, Some(chat));
            assert_eq!(n.reference(), Some(NotificationRef::Chat(chat)));
        }
    }

    #[test]
    fn follow_has_no_referent() {
        let n = notification(NotificationKind::Follow, None, None);
        assert_eq!(n.reference(), None);
    }

    #[test]
    fn missing_referent_column_resolves_to_none() {
        // Kind says post but the column is empty: no referent, never a failure.
        let n = notification(NotificationKind::Like, None, None);
        assert_eq!(n.reference(), None);
    }

    #[test]
    fn unresolved_reference_serializes_raw() {
        let post = Uuid::new_v4();
        let json = serde_json::to_value(NotificationRef::Post(post)).unwrap();
        assert_eq!(json, serde_json::json!({ "post": post }));

        // The raw reference survives into the resolved wire shape.
        let resolved = ResolvedNotification {
            notification: notification(NotificationKind::Like, Some(post), None),
            instance: Some(json),
        };
        let body = serde_json::to_value(&resolved).unwrap();
        assert_eq!(body["instance"]["post"], serde_json::json!(post));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&NotificationKind::AddedToChat).unwrap();
        assert_eq!(json, "\"added_to_chat\"");
        assert_eq!(NotificationKind::NewMessage.as_str(), "new_message");
    }
}
