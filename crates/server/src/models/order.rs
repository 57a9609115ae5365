//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplyhub_core::{DeliveryStatus, OrderId, OrderState, OrderStatus, Price, ProductId, UserId};

/// A customer order for a single catalog item.
///
/// `user_id`, `product_id`, `quantity`, `total_price` and `created_at` are
/// fixed at creation. The remaining fields change only through the order
/// lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Customer who placed the order.
    pub user_id: UserId,
    /// Ordered catalog item.
    pub product_id: ProductId,
    /// Units ordered (always positive).
    pub quantity: i32,
    /// `product.price * quantity` at the moment the order was placed.
    pub total_price: Price,
    /// Approval state.
    pub status: OrderStatus,
    /// Payment and fulfillment sub-state.
    pub delivery_status: DeliveryStatus,
    /// Opaque reference to the uploaded payment proof.
    pub payment_proof: Option<String>,
    /// Whether staff accepted the payment proof.
    pub payment_verified: bool,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order last changed state.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The lifecycle fields as an [`OrderState`].
    #[must_use]
    pub const fn state(&self) -> OrderState {
        OrderState {
            status: self.status,
            delivery_status: self.delivery_status,
            payment_verified: self.payment_verified,
            has_payment_proof: self.payment_proof.is_some(),
        }
    }
}

/// Input for inserting a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub total_price: Price,
}

/// Filter for listing orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Restrict to one customer's orders.
    pub user_id: Option<UserId>,
    /// Restrict to one status.
    pub status: Option<OrderStatus>,
}
