use crate::error::AppError;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Lifetime of issued auth tokens (and their cookies), in days.
    pub jwt_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL missing".into()))?;
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| AppError::Config("JWT_SECRET missing".into()))?;
        let jwt_ttl_days = env::var("JWT_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        if jwt_ttl_days <= 0 {
            return Err(AppError::Config("JWT_TTL_DAYS must be positive".into()));
        }

        Ok(Self {
            database_url,
            port,
            jwt_secret,
            jwt_ttl_days,
        })
    }
}
