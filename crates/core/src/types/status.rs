//! Status enums for orders and notifications.
//!
//! All enums serialise as `SCREAMING_SNAKE_CASE`, matching both the JSON API
//! and the Postgres enum types created by the server migrations.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Customer-facing approval state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Delivered,
}

impl OrderStatus {
    /// No transition leaves a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Delivered)
    }

    /// The wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "DELIVERED" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Fulfillment and payment sub-state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    #[default]
    NotShipped,
    PendingPayment,
    PaymentRejected,
    DeliveryInProgress,
    Delivered,
}

impl DeliveryStatus {
    /// The wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotShipped => "NOT_SHIPPED",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::PaymentRejected => "PAYMENT_REJECTED",
            Self::DeliveryInProgress => "DELIVERY_IN_PROGRESS",
            Self::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag identifying why a notification was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "notification_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    OrderConfirmed,
    OrderRejected,
    PaymentUploaded,
    PaymentVerified,
    PaymentRejected,
    OrderDelivered,
    AccountApproved,
}

impl NotificationKind {
    /// The wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderConfirmed => "ORDER_CONFIRMED",
            Self::OrderRejected => "ORDER_REJECTED",
            Self::PaymentUploaded => "PAYMENT_UPLOADED",
            Self::PaymentVerified => "PAYMENT_VERIFIED",
            Self::PaymentRejected => "PAYMENT_REJECTED",
            Self::OrderDelivered => "ORDER_DELIVERED",
            Self::AccountApproved => "ACCOUNT_APPROVED",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_new_order() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(DeliveryStatus::default(), DeliveryStatus::NotShipped);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Approved.is_terminal());
    }

    #[test]
    fn test_wire_names_match_serde() {
        let json = serde_json::to_string(&DeliveryStatus::DeliveryInProgress).unwrap();
        assert_eq!(json, "\"DELIVERY_IN_PROGRESS\"");
        assert_eq!(DeliveryStatus::DeliveryInProgress.as_str(), "DELIVERY_IN_PROGRESS");

        let json = serde_json::to_string(&NotificationKind::PaymentUploaded).unwrap();
        assert_eq!(json, format!("\"{}\"", NotificationKind::PaymentUploaded));
    }

    #[test]
    fn test_order_status_from_query_param() {
        assert_eq!("approved".parse::<OrderStatus>().unwrap(), OrderStatus::Approved);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }
}
