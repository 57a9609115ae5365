//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                          - Liveness
//! GET   /health/ready                    - Readiness (store ping)
//!
//! # Catalog
//! GET   /api/products                    - Search and paginate products
//! POST  /api/products                    - Create product (staff)
//! PATCH /api/products/{id}               - Update name, price or stock (staff)
//!
//! # Orders
//! GET   /api/orders                      - List orders (customers see their own)
//! POST  /api/orders                      - Place order
//! GET   /api/orders/{id}                 - Order detail
//! PATCH /api/orders/{id}                 - Approve or decline (staff)
//! POST  /api/orders/{id}/payment         - Upload payment proof (owner)
//! POST  /api/orders/{id}/verify-payment  - Accept or reject payment (staff)
//! POST  /api/orders/{id}/mark-delivered  - Confirm delivery (staff)
//!
//! # Notifications
//! GET   /api/notifications               - Latest notifications and unread count
//! POST  /api/notifications/{id}/read     - Mark one read
//! POST  /api/notifications/mark-all-read - Mark all read
//!
//! # Accounts
//! GET   /api/users?role=                 - Account directory by role
//! POST  /api/users/{id}/approve          - Approve account (super admin)
//!
//! # Messages
//! GET   /api/messages?userId=            - Own messages, or one conversation
//! POST  /api/messages                    - Send message
//! PATCH /api/messages/{id}/read          - Mark received message read
//! ```

pub mod messages;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod users;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::db::Store;
use crate::state::AppState;

/// Build the complete router.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .merge(products::router())
        .merge(orders::router())
        .merge(notifications::router())
        .merge(users::router())
        .merge(messages::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
