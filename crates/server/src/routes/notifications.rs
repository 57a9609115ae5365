//! Notification inbox handlers.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::PathRejection},
    routing::{get, post},
};
use serde::Serialize;

use supplyhub_core::NotificationId;

use crate::{
    db::Store, error::AppError, middleware::RequireActor, models::Notification, state::AppState,
};

/// Build the notifications router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/notifications", get(list_notifications::<S>))
        .route("/api/notifications/{id}/read", post(mark_read::<S>))
        .route("/api/notifications/mark-all-read", post(mark_all_read::<S>))
}

/// The caller's inbox.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

/// Result of a read-marking request.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub updated: u64,
}

/// The caller's most recent notifications and unread count.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn list_notifications<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
) -> Result<Json<InboxResponse>, AppError> {
    let limit = state.settings().notification_page_size;
    let notifications = state.store().list_notifications(actor.id, limit).await?;
    let unread_count = state.store().unread_count(actor.id).await?;
    Ok(Json(InboxResponse {
        notifications,
        unread_count,
    }))
}

/// Mark one of the caller's notifications read.
///
/// # Errors
///
/// Returns 404 if the notification does not exist or belongs to someone else.
pub async fn mark_read<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<NotificationId>, PathRejection>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let Path(id) = path?;
    if !state.store().mark_read(id, actor.id).await? {
        return Err(AppError::NotFound(format!("notification {id}")));
    }
    Ok(Json(MarkReadResponse {
        success: true,
        updated: 1,
    }))
}

/// Mark all of the caller's notifications read.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn mark_all_read<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let updated = state.store().mark_all_read(actor.id).await?;
    Ok(Json(MarkReadResponse {
        success: true,
        updated,
    }))
}
