//! Caller identity extraction.
//!
//! Tokens are accepted from the `token` cookie set at login or from an
//! `Authorization: Bearer` header. Handlers taking an [`AuthUser`] parameter
//! cannot run without a verified identity.

use crate::{error::AppError, security::token, state::AppState};
use actix_web::http::header;
use actix_web::{web, Error, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

/// An authenticated user resolved before core invocation.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie("token") {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .app_data::<web::Data<AppState>>()
            .ok_or(AppError::Internal)
            .and_then(|state| {
                let token = bearer_token(req).ok_or(AppError::Unauthorized)?;
                let id = token::verify(&state.config.jwt_secret, &token)?;
                Ok(AuthUser { id })
            });

        ready(result.map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_header_is_extracted() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_credentials_yield_none() {
        let req = TestRequest::default().to_http_request();
        assert!(bearer_token(&req).is_none());
    }
}
