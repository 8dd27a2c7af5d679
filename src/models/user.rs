use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Full account row, including the credential hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: String,
    pub cover_image: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserAccount> for UserProfile {
    fn from(account: UserAccount) -> Self {
        UserProfile {
            id: account.id,
            username: account.username,
            first_name: account.first_name,
            last_name: account.last_name,
            profile_image: account.profile_image,
            cover_image: account.cover_image,
            closed: account.closed,
            created_at: account.created_at,
        }
    }
}

/// Public projection of a user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: String,
    pub cover_image: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
}

/// Profile plus both projections of the follow relation. The edge is stored
/// once in `follows`, so `a ∈ following(b)` and `b ∈ followers(a)` are the
/// same row read from either end.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileWithEdges {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
}
