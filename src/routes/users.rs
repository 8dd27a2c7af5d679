//! Account and social-graph endpoints.

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::UserProfile,
    routes::Data,
    security::{password, token},
    services::{ContentService, IdentityService, SocialGraphService},
    state::AppState,
};
use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 50, message = "firstname must be 2-50 characters"))]
    pub firstname: String,
    #[validate(length(min = 2, max = 50, message = "lastname must be 2-50 characters"))]
    pub lastname: String,
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "please add a valid email"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Debug, Deserialize)]
pub struct NewsfeedQuery {
    #[serde(default = "default_feed_limit")]
    pub limit: i64,
}

fn default_feed_limit() -> i64 {
    50
}

fn auth_cookie(state: &AppState, user_id: Uuid) -> AppResult<Cookie<'static>> {
    let token = token::issue(&state.config.jwt_secret, user_id, state.config.jwt_ttl_days)?;
    Ok(Cookie::build("token", token)
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::days(state.config.jwt_ttl_days))
        .finish())
}

#[post("/user/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let password_hash = password::hash_password(&body.password)?;
    let created = IdentityService::new(state.db.clone())
        .create_user(
            &body.username,
            &body.email,
            &password_hash,
            &body.firstname,
            &body.lastname,
        )
        .await?;

    let cookie = auth_cookie(&state, created.id)?;
    Ok(HttpResponse::Created()
        .cookie(cookie)
        .json(Data { data: created }))
}

#[post("/user/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let account = IdentityService::new(state.db.clone())
        .find_by_email(&body.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password::verify_password(&body.password, &account.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let cookie = auth_cookie(&state, account.id)?;
    let logged_in = UserProfile::from(account);
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(Data { data: logged_in }))
}

#[get("/user/me")]
pub async fn me(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let with_edges = SocialGraphService::new(state.db.clone())
        .profile_with_edges(user.id)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: with_edges }))
}

#[get("/user/{id}/profile")]
pub async fn profile(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let with_edges = SocialGraphService::new(state.db.clone())
        .profile_with_edges(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: with_edges }))
}

/// Toggle the follow edge towards `{id}`.
#[put("/user/{id}/follow")]
pub async fn follow(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let outcome = SocialGraphService::new(state.db.clone())
        .follow_toggle(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: outcome }))
}

#[post("/user/search")]
pub async fn search(
    state: web::Data<AppState>,
    _user: AuthUser,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse, AppError> {
    let users = IdentityService::new(state.db.clone())
        .search(&body.term)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: users }))
}

#[get("/user/newsfeed")]
pub async fn newsfeed(
    state: web::Data<AppState>,
    user: AuthUser,
    query: web::Query<NewsfeedQuery>,
) -> Result<HttpResponse, AppError> {
    let posts = ContentService::new(state.db.clone())
        .newsfeed(user.id, query.limit.clamp(1, 200))
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: posts }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RegisterRequest {
        RegisterRequest {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        }
    }

    #[test]
    fn register_request_accepts_valid_input() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn register_request_rejects_short_names_and_bad_email() {
        let mut req = valid_request();
        req.firstname = "A".into();
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.email = "not-an-email".into();
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.password = "short".into();
        assert!(req.validate().is_err());
    }
}
