use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A post row together with its like and retweet projections.
///
/// A row with `reply_to` set is a comment; one with `retweet_of` set is a
/// reshare; neither set means an original post. `retweet_users` is derived
/// from the reshare rows pointing at this post, so it cannot drift from the
/// per-user retweet state.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub images: Vec<String>,
    pub reply_to: Option<Uuid>,
    pub retweet_of: Option<Uuid>,
    pub likes: Vec<Uuid>,
    pub retweet_users: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Select list producing a [`PostView`] from a `posts p` row.
pub const POST_VIEW_COLUMNS: &str = r#"
    p.id, p.author_id, p.content, p.images, p.reply_to, p.retweet_of,
    ARRAY(SELECT pl.user_id FROM post_likes pl
          WHERE pl.post_id = p.id ORDER BY pl.created_at) AS likes,
    ARRAY(SELECT rp.author_id FROM posts rp
          WHERE rp.retweet_of = p.id ORDER BY rp.created_at) AS retweet_users,
    p.created_at
"#;
