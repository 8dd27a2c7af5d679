//! Follow/unfollow with symmetric edge maintenance.
//!
//! An edge lives once in the `follows` relation; `following` and `followers`
//! are the two projections of the same rows, so the mirror invariant cannot
//! be violated by a partial write.

use crate::error::{AppError, AppResult};
use crate::models::{NotificationKind, ProfileWithEdges, UserProfile};
use crate::services::NotificationWriter;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct FollowOutcome {
    /// True when the toggle added the edge, false when it removed it.
    pub followed: bool,
    pub actor: ProfileWithEdges,
    pub target: ProfileWithEdges,
}

#[derive(Clone)]
pub struct SocialGraphService {
    pool: PgPool,
}

impl SocialGraphService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Toggle the `actor → target` edge. Following emits a `follow`
    /// notification; unfollowing emits nothing and retracts no history.
    pub async fn follow_toggle(&self, actor: Uuid, target: Uuid) -> AppResult<FollowOutcome> {
        if actor == target {
            return Err(AppError::SelfReference("you can't follow yourself".into()));
        }

        let target_open: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND NOT closed)")
                .bind(target)
                .fetch_one(&self.pool)
                .await?;
        if !target_open {
            return Err(AppError::NotFound("user not found".into()));
        }

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(actor)
            .bind(target)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let followed = removed == 0;
        if followed {
            sqlx::query(
                r#"
                INSERT INTO follows (follower_id, followee_id)
                VALUES ($1, $2)
                ON CONFLICT (follower_id, followee_id) DO NOTHING
                "#,
            )
            .bind(actor)
            .bind(target)
            .execute(&mut *tx)
            .await?;

            NotificationWriter::notify(&mut tx, actor, target, NotificationKind::Follow, None)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(%actor, %target, followed, "follow toggled");

        Ok(FollowOutcome {
            followed,
            actor: self.profile_with_edges(actor).await?,
            target: self.profile_with_edges(target).await?,
        })
    }

    /// Profile plus both projections of the follow relation.
    pub async fn profile_with_edges(&self, id: Uuid) -> AppResult<ProfileWithEdges> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, first_name, last_name, profile_image, cover_image,
                   closed, created_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".into()))?;

        let following: Vec<Uuid> =
            sqlx::query_scalar("SELECT followee_id FROM follows WHERE follower_id = $1 ORDER BY created_at")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        let followers: Vec<Uuid> =
            sqlx::query_scalar("SELECT follower_id FROM follows WHERE followee_id = $1 ORDER BY created_at")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ProfileWithEdges {
            profile,
            following,
            followers,
        })
    }
}
