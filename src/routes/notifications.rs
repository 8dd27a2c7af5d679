//! Notification endpoints.

use crate::{
    error::AppError, middleware::AuthUser, routes::Data, services::ReadStateService,
    state::AppState,
};
use actix_web::{get, put, web, HttpResponse};
use uuid::Uuid;

/// Unopened notifications for the caller, each resolved against its referent.
#[get("/notification/unread")]
pub async fn unread(state: web::Data<AppState>, user: AuthUser) -> Result<HttpResponse, AppError> {
    let notifications = ReadStateService::new(state.db.clone())
        .unread_notifications(user.id)
        .await?;
    Ok(HttpResponse::Ok().json(Data {
        data: notifications,
    }))
}

/// Mark one of the caller's notifications opened.
#[put("/notification/{id}/open")]
pub async fn open(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let notification = ReadStateService::new(state.db.clone())
        .open_notification(user.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(Data { data: notification }))
}
