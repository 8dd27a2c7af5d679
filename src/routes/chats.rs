//! Conversation endpoints: chats, messages, membership, read state.

use crate::{
    error::AppError,
    middleware::AuthUser,
    routes::Data,
    services::{ConversationService, ReadStateService},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NewChatRequest {
    pub users: Vec<Uuid>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUsersRequest {
    pub users: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[post("/chat/new-chat")]
pub async fn new_chat(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<NewChatRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let chat = ConversationService::new(state.db.clone())
        .create_group_chat(user.id, body.users, body.title)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: chat }))
}

#[get("/chat/inbox")]
pub async fn inbox(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let chats = ReadStateService::new(state.db.clone()).inbox(user.id).await?;
    Ok(HttpResponse::Ok().json(Data { data: chats }))
}

#[get("/chat/unread-messages")]
pub async fn unread_messages(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let unread = ReadStateService::new(state.db.clone())
        .unread_messages(user.id)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: unread }))
}

/// Send a message into chat `{id}`, or lazily create the direct chat when
/// `{id}` names a user.
#[post("/chat/{id}")]
pub async fn send_message(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
    let message = ConversationService::new(state.db.clone())
        .send_to_target(user.id, path.into_inner(), &body.content)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: message }))
}

/// Fetch a chat. Side effect: every message in it becomes read by the caller.
#[get("/chat/{id}")]
pub async fn get_chat(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let chat = ConversationService::new(state.db.clone())
        .get_chat(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: chat }))
}

#[post("/chat/{id}/add-user")]
pub async fn add_users(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<AddUsersRequest>,
) -> Result<HttpResponse, AppError> {
    let chat = ConversationService::new(state.db.clone())
        .add_users(user.id, path.into_inner(), body.into_inner().users)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: chat }))
}

#[get("/chat/{id}/last-message")]
pub async fn last_message(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let message = ConversationService::new(state.db.clone())
        .get_last_message(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: message }))
}

#[put("/chat/{id}/leave")]
pub async fn leave_chat(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let chat = ConversationService::new(state.db.clone())
        .leave_chat(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: chat }))
}

#[put("/chat/{id}/update-title")]
pub async fn update_title(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTitleRequest>,
) -> Result<HttpResponse, AppError> {
    let chat = ConversationService::new(state.db.clone())
        .update_chat_title(user.id, path.into_inner(), &body.title)
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: chat }))
}

#[delete("/chat/{message_id}/delete-message")]
pub async fn delete_message(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let message = ConversationService::new(state.db.clone())
        .delete_message(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: message }))
}
