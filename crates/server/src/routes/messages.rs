//! Direct message handlers.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};

use supplyhub_core::{MessageId, UserId};

use crate::{
    db::Store, error::AppError, middleware::RequireActor, models::Message, state::AppState,
};

/// Build the messages router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/api/messages",
            get(list_messages::<S>).post(send_message::<S>),
        )
        .route(
            "/api/messages/{id}/read",
            patch(mark_read::<S>).post(mark_read::<S>),
        )
}

/// Query parameters for listing messages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    /// Restrict to the conversation with this account.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Request for sending a message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub message: String,
}

/// Response with a list of messages.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

/// Response with a single message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: Message,
}

/// Result of marking a message read.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
}

/// The caller's messages, or one conversation when `userId` is given.
///
/// # Errors
///
/// Returns an error if the query string is invalid or the store fails.
pub async fn list_messages<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> Result<Json<MessagesResponse>, AppError> {
    let Query(query) = query?;
    let messages = state.messages().list(actor, query.user_id).await?;
    Ok(Json(MessagesResponse { messages }))
}

/// Send a message.
///
/// # Errors
///
/// Returns 400 for a blank message and 404 if the receiver does not exist.
pub async fn send_message<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(body) = body?;
    let message = state
        .messages()
        .send(actor, body.receiver_id, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// Mark a received message read.
///
/// # Errors
///
/// Returns 404 if the message does not exist or was sent to someone else.
pub async fn mark_read<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<MessageId>, PathRejection>,
) -> Result<Json<MarkReadResponse>, AppError> {
    let Path(id) = path?;
    state.messages().mark_read(actor, id).await?;
    Ok(Json(MarkReadResponse { success: true }))
}
