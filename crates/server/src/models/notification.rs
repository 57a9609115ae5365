//! Notification domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplyhub_core::{NotificationId, NotificationKind, OrderId, UserId};

/// A fact recorded for a recipient. Only `is_read` ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification ID.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Order the notification is about, if any.
    pub order_id: Option<OrderId>,
    /// Why the notification was created.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a notification.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub order_id: Option<OrderId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}
