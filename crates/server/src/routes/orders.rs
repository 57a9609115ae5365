//! Order API handlers.
//!
//! Thin adapters from HTTP to the Order Lifecycle Engine: they parse the
//! request, pass the caller's identity through, and wrap the result.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplyhub_core::{DeliveryStatus, Email, OrderId, OrderStatus, Price, ProductId, UserId};

use crate::{
    db::Store,
    error::AppError,
    middleware::RequireActor,
    models::{Order, Product, User},
    services::Decision,
    state::AppState,
};

/// Build the orders router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/orders", get(list_orders::<S>).post(create_order::<S>))
        .route(
            "/api/orders/{id}",
            get(get_order::<S>).patch(decide_order::<S>),
        )
        .route("/api/orders/{id}/payment", post(upload_payment::<S>))
        .route("/api/orders/{id}/verify-payment", post(verify_payment::<S>))
        .route("/api/orders/{id}/mark-delivered", post(mark_delivered::<S>))
}

/// Query parameters for listing orders.
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Request for placing an order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Request for approving or declining an order.
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    /// `APPROVED` or `REJECTED`.
    pub status: OrderStatus,
}

/// Request for attaching a payment proof.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProofRequest {
    pub payment_proof: String,
}

/// Staff verdict on a payment proof.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Approve,
    Reject,
}

/// Request for verifying a payment.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub action: VerifyAction,
}

/// The ordered product, as embedded in order responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
}

impl From<Product> for ProductSummary {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
        }
    }
}

/// The ordering account, as embedded in order responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// An order with its product and owner.
///
/// `product.price` is the current price; `total_price` stays what was
/// charged when the order was placed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub total_price: Price,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    pub payment_proof: Option<String>,
    pub payment_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` only if the product row is gone.
    pub product: Option<ProductSummary>,
    /// `None` only if the account row is gone.
    pub user: Option<UserSummary>,
}

impl OrderView {
    fn new(order: Order, product: Option<ProductSummary>, user: Option<UserSummary>) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
            total_price: order.total_price,
            status: order.status,
            delivery_status: order.delivery_status,
            payment_proof: order.payment_proof,
            payment_verified: order.payment_verified,
            created_at: order.created_at,
            updated_at: order.updated_at,
            product,
            user,
        }
    }
}

/// Response with a single order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: OrderView,
}

/// Response with a list of orders.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderView>,
}

/// Looks up the product and owner of each order, once per ID.
struct Embedder<'a, S> {
    store: &'a S,
    products: HashMap<ProductId, Option<ProductSummary>>,
    users: HashMap<UserId, Option<UserSummary>>,
}

impl<'a, S: Store> Embedder<'a, S> {
    fn new(store: &'a S) -> Self {
        Self {
            store,
            products: HashMap::new(),
            users: HashMap::new(),
        }
    }

    async fn view(&mut self, order: Order) -> Result<OrderView, AppError> {
        let product = match self.products.get(&order.product_id) {
            Some(cached) => cached.clone(),
            None => {
                let found = self
                    .store
                    .get_product(order.product_id)
                    .await?
                    .map(ProductSummary::from);
                self.products.insert(order.product_id, found.clone());
                found
            }
        };
        let user = match self.users.get(&order.user_id) {
            Some(cached) => cached.clone(),
            None => {
                let found = self
                    .store
                    .get_user(order.user_id)
                    .await?
                    .map(UserSummary::from);
                self.users.insert(order.user_id, found.clone());
                found
            }
        };
        Ok(OrderView::new(order, product, user))
    }
}

async fn respond<S: Store>(
    state: &AppState<S>,
    order: Order,
) -> Result<OrderResponse, AppError> {
    let order = Embedder::new(state.store()).view(order).await?;
    Ok(OrderResponse { order })
}

/// List orders, newest first. Customers only see their own.
///
/// # Errors
///
/// Returns an error if the query string is invalid or the store fails.
pub async fn list_orders<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Json<OrdersResponse>, AppError> {
    let Query(query) = query?;
    let orders = state.lifecycle().list_orders(actor, query.status).await?;

    let mut embedder = Embedder::new(state.store());
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        views.push(embedder.view(order).await?);
    }
    Ok(Json(OrdersResponse { orders: views }))
}

/// Place an order.
///
/// # Errors
///
/// Returns 404 if the product does not exist and 400 for a bad quantity,
/// insufficient stock, or a total above the maximum price.
pub async fn create_order<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let Json(body) = body?;
    let order = state
        .lifecycle()
        .create_order(actor, body.product_id, body.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(respond(&state, order).await?)))
}

/// Get one order.
///
/// # Errors
///
/// Returns 404 if the order does not exist and 403 if it belongs to someone
/// else.
pub async fn get_order<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderResponse>, AppError> {
    let Path(id) = path?;
    let order = state.lifecycle().get_order(actor, id).await?;
    Ok(Json(respond(&state, order).await?))
}

/// Approve or decline a pending order.
///
/// # Errors
///
/// Returns 400 unless the requested status is `APPROVED` or `REJECTED`, and
/// 409 if the order is no longer pending.
pub async fn decide_order<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<DecideRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, AppError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let decision = match body.status {
        OrderStatus::Approved => Decision::Approve,
        OrderStatus::Rejected => Decision::Reject,
        other => {
            return Err(AppError::BadRequest(format!(
                "status must be APPROVED or REJECTED, got {other}"
            )));
        }
    };

    let order = state.lifecycle().decide(actor, id, decision).await?;
    Ok(Json(respond(&state, order).await?))
}

/// Attach a payment proof.
///
/// # Errors
///
/// Returns 403 unless the caller owns the order and 409 unless the order
/// awaits payment.
pub async fn upload_payment<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<PaymentProofRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, AppError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let order = state
        .lifecycle()
        .upload_payment_proof(actor, id, &body.payment_proof)
        .await?;
    Ok(Json(respond(&state, order).await?))
}

/// Accept or reject a payment proof.
///
/// # Errors
///
/// Returns 403 for customers and 409 unless an unverified proof is attached.
pub async fn verify_payment<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> Result<Json<OrderResponse>, AppError> {
    let Path(id) = path?;
    let Json(body) = body?;
    let decision = match body.action {
        VerifyAction::Approve => Decision::Approve,
        VerifyAction::Reject => Decision::Reject,
    };
    let order = state
        .lifecycle()
        .verify_payment(actor, id, decision)
        .await?;
    Ok(Json(respond(&state, order).await?))
}

/// Confirm delivery.
///
/// # Errors
///
/// Returns 403 for customers, 409 unless delivery is in progress, and 400
/// if stock no longer covers the order.
pub async fn mark_delivered<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderResponse>, AppError> {
    let Path(id) = path?;
    let order = state.lifecycle().mark_delivered(actor, id).await?;
    Ok(Json(respond(&state, order).await?))
}
