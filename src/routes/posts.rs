//! Content endpoints: posts, likes, comments, retweets, search.

use crate::{
    error::AppError, middleware::AuthUser, routes::Data, services::ContentService, state::AppState,
};
use actix_web::{delete, post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NewPostRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub term: String,
}

#[post("/post/new")]
pub async fn new_post(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<NewPostRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let post = ContentService::new(state.db.clone())
        .create_post(user.id, &body.content, body.images)
        .await?;
    Ok(HttpResponse::Created().json(Data { data: post }))
}

/// Like or unlike `{id}`.
#[put("/post/{id}/like")]
pub async fn like(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let post = ContentService::new(state.db.clone())
        .toggle_like(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: post }))
}

#[post("/post/{id}/comment")]
pub async fn comment(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> Result<HttpResponse, AppError> {
    let post = ContentService::new(state.db.clone())
        .create_comment(user.id, path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Created().json(Data { data: post }))
}

#[post("/post/{id}/retweet")]
pub async fn retweet(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let post = ContentService::new(state.db.clone())
        .retweet(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(Data { data: post }))
}

#[delete("/post/{id}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    ContentService::new(state.db.clone())
        .delete_post(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/post/search")]
pub async fn search(
    state: web::Data<AppState>,
    _user: AuthUser,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse, AppError> {
    let posts = ContentService::new(state.db.clone())
        .search(&body.term)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: posts }))
}
