//! HS256 bearer tokens carried in the `token` cookie or Authorization header.
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue(secret: &str, user_id: Uuid, ttl_days: i64) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        iat: now.timestamp(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        AppError::Internal
    })
}

/// Returns the authenticated user id, or `Unauthorized` for any invalid,
/// expired, or tampered token.
pub fn verify(secret: &str, token: &str) -> AppResult<Uuid> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    Ok(data.claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_roundtrip() {
        let user = Uuid::new_v4();
        let token = issue("test-secret", user, 1).unwrap();
        assert_eq!(verify("test-secret", &token).unwrap(), user);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("secret-a", Uuid::new_v4(), 1).unwrap();
        assert!(matches!(
            verify("secret-b", &token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            verify("secret", "not.a.token"),
            Err(AppError::Unauthorized)
        ));
    }
}
