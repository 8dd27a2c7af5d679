use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error, Clone)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DuplicateAction(String),

    #[error("{0}")]
    SelfReference(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal server error")]
    Internal,
}

/// Wire shape of every error response: `{ "success": false, "error": "..." }`
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl AppError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::DuplicateAction(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::SelfReference(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Database(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to clients. Storage and config failures are not leaked.
    fn public_message(&self) -> String {
        match self {
            AppError::Config(_) | AppError::Database(_) | AppError::Internal => {
                "internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        if self.http_status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        HttpResponse::build(self.http_status()).json(ErrorBody {
            success: false,
            error: self.public_message(),
        })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("resource not found".into()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::Validation("duplicate field value entered".into())
            }
            _ => AppError::Database(e.to_string()),
        }
    }
}
