//! User account storage and lookups.

use crate::error::AppResult;
use crate::models::{UserAccount, UserProfile};
use sqlx::PgPool;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                               profile_image, cover_image, closed, created_at";

const PROFILE_COLUMNS: &str = "id, username, first_name, last_name, profile_image, cover_image, \
                               closed, created_at";

#[derive(Clone)]
pub struct IdentityService {
    pool: PgPool,
}

impl IdentityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account. Unique violations on username/email surface as
    /// a validation error through the storage-boundary translation.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> AppResult<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %profile.id, "user registered");
        Ok(profile)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let account = sqlx::query_as::<_, UserAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1 AND NOT closed"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// True when the id resolves to an open account.
    pub async fn user_exists(&self, id: Uuid) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND NOT closed)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Case-insensitive substring search over username and real name.
    /// Closed accounts are hidden.
    pub async fn search(&self, term: &str) -> AppResult<Vec<UserProfile>> {
        let pattern = crate::services::content::like_pattern(term);
        let users = sqlx::query_as::<_, UserProfile>(&format!(
            r#"
            SELECT {PROFILE_COLUMNS} FROM users
            WHERE NOT closed
              AND (username ILIKE $1 OR first_name ILIKE $1 OR last_name ILIKE $1)
            ORDER BY username
            "#
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
