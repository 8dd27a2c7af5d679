//! Posts, likes, comments, retweets, search, and the newsfeed.

use crate::error::{AppError, AppResult};
use crate::models::post::POST_VIEW_COLUMNS;
use crate::models::{NotificationKind, NotificationRef, PostView};
use crate::services::NotificationWriter;
use sqlx::PgPool;
use uuid::Uuid;

/// Escape LIKE metacharacters and wrap the term for substring matching.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(Clone)]
pub struct ContentService {
    pool: PgPool,
}

impl ContentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_post(&self, id: Uuid) -> AppResult<PostView> {
        sqlx::query_as::<_, PostView>(&format!(
            "SELECT {POST_VIEW_COLUMNS} FROM posts p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("post not found".into()))
    }

    /// Create an original post. Content may be empty only when images are
    /// attached.
    pub async fn create_post(
        &self,
        author: Uuid,
        content: &str,
        images: Vec<String>,
    ) -> AppResult<PostView> {
        if content.trim().is_empty() && images.is_empty() {
            return Err(AppError::Validation(
                "a post needs content or at least one image".into(),
            ));
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO posts (id, author_id, content, images)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author)
        .bind(content)
        .bind(images)
        .fetch_one(&self.pool)
        .await?;

        self.get_post(id).await
    }

    /// Like or unlike. The like transition notifies the author; unlike
    /// emits nothing.
    pub async fn toggle_like(&self, user: Uuid, post_id: Uuid) -> AppResult<PostView> {
        let post = self.get_post(post_id).await?;

        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO post_likes (post_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (post_id, user_id) DO NOTHING
                "#,
            )
            .bind(post_id)
            .bind(user)
            .execute(&mut *tx)
            .await?;

            NotificationWriter::notify(
                &mut tx,
                user,
                post.author_id,
                NotificationKind::Like,
                Some(NotificationRef::Post(post_id)),
            )
            .await?;
        }

        tx.commit().await?;
        self.get_post(post_id).await
    }

    /// A comment is a post replying to its parent.
    pub async fn create_comment(
        &self,
        user: Uuid,
        parent_id: Uuid,
        content: &str,
    ) -> AppResult<PostView> {
        let parent = self.get_post(parent_id).await?;

        if content.trim().is_empty() {
            return Err(AppError::Validation("a comment needs content".into()));
        }

        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO posts (id, author_id, content, reply_to)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user)
        .bind(content)
        .bind(parent_id)
        .fetch_one(&mut *tx)
        .await?;

        NotificationWriter::notify(
            &mut tx,
            user,
            parent.author_id,
            NotificationKind::Comment,
            Some(NotificationRef::Post(parent_id)),
        )
        .await?;

        tx.commit().await?;
        self.get_post(id).await
    }

    /// Reshare a post. The partial unique index over `(author_id,
    /// retweet_of)` enforces at-most-once per user.
    pub async fn retweet(&self, user: Uuid, post_id: Uuid) -> AppResult<PostView> {
        let target = self.get_post(post_id).await?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO posts (id, author_id, content, retweet_of)
            VALUES ($1, $2, '', $3)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user)
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await;

        let id = match inserted {
            Ok(id) => id,
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                return Err(AppError::DuplicateAction(
                    "you already retweeted this post".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        NotificationWriter::notify(
            &mut tx,
            user,
            target.author_id,
            NotificationKind::Retweet,
            Some(NotificationRef::Post(post_id)),
        )
        .await?;

        tx.commit().await?;
        self.get_post(id).await
    }

    /// Hard delete, reserved to the author.
    pub async fn delete_post(&self, actor: Uuid, post_id: Uuid) -> AppResult<()> {
        let post = self.get_post(post_id).await?;
        if post.author_id != actor {
            return Err(AppError::Forbidden(
                "you can't delete this post, operation reserved to the owner".into(),
            ));
        }

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(%post_id, %actor, "post deleted");
        Ok(())
    }

    /// Case-insensitive substring match over content, newest first.
    pub async fn search(&self, term: &str) -> AppResult<Vec<PostView>> {
        let posts = sqlx::query_as::<_, PostView>(&format!(
            r#"
            SELECT {POST_VIEW_COLUMNS} FROM posts p
            WHERE p.content ILIKE $1
            ORDER BY p.created_at DESC
            "#
        ))
        .bind(like_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Posts from followees and self, newest first.
    pub async fn newsfeed(&self, actor: Uuid, limit: i64) -> AppResult<Vec<PostView>> {
        let posts = sqlx::query_as::<_, PostView>(&format!(
            r#"
            SELECT {POST_VIEW_COLUMNS} FROM posts p
            WHERE p.author_id = $1
               OR p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = $1)
            ORDER BY p.created_at DESC
            LIMIT $2
            "#
        ))
        .bind(actor)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("hello"), "%hello%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
