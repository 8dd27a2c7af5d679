//! Notification fan-out.
//!
//! The append-only notification log has exactly one writer: this module.
//! Every mutating service hands its open transaction here on the specific
//! transitions that notify, so an event is committed if and only if the
//! triggering mutation commits. Actors never notify themselves; the rule is
//! enforced once, for every kind.

use crate::error::AppResult;
use crate::models::{NotificationKind, NotificationRef};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

pub struct NotificationWriter;

impl NotificationWriter {
    /// Append one event for `to`. Self-targeted events are suppressed.
    pub async fn notify(
        tx: &mut Transaction<'_, Postgres>,
        from: Uuid,
        to: Uuid,
        kind: NotificationKind,
        reference: Option<NotificationRef>,
    ) -> AppResult<()> {
        if from == to {
            return Ok(());
        }

        let (post_id, chat_id) = match reference {
            Some(NotificationRef::Post(id)) => (Some(id), None),
            Some(NotificationRef::Chat(id)) => (None, Some(id)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO notifications (id, from_user, to_user, kind, post_id, chat_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(from)
        .bind(to)
        .bind(kind)
        .bind(post_id)
        .bind(chat_id)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(kind = kind.as_str(), %from, %to, "notification appended");
        Ok(())
    }

    /// Fan out one event per recipient from a single triggering action.
    pub async fn notify_many(
        tx: &mut Transaction<'_, Postgres>,
        from: Uuid,
        recipients: &[Uuid],
        kind: NotificationKind,
        reference: Option<NotificationRef>,
    ) -> AppResult<()> {
        for &to in recipients {
            Self::notify(tx, from, to, kind, reference).await?;
        }
        Ok(())
    }
}
