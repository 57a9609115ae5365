//! Notification emitter.
//!
//! Emission always happens after the order change it reports has committed.
//! Failures are logged and swallowed: a notification can never undo or block
//! the transition that produced it. Duplicates are acceptable.

use tracing::{debug, instrument, warn};

use supplyhub_core::{NotificationKind, OrderId, Role, UserId};

use crate::db::{NotificationStore, UserStore};
use crate::models::{NewNotification, Notification};

/// Title and body of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationText {
    pub title: String,
    pub body: String,
}

impl NotificationText {
    fn new(title: &str, body: String) -> Self {
        Self {
            title: title.to_string(),
            body,
        }
    }
}

/// What an order notification refers to.
#[derive(Debug, Clone, Copy)]
pub struct OrderContext<'a> {
    /// The order being reported on.
    pub order_id: OrderId,
    /// Name of the ordered product.
    pub product: &'a str,
    /// Display name of the user who acted.
    pub actor_name: &'a str,
    /// Role of the user who acted.
    pub actor_role: Role,
}

/// Wording for an order notification of the given kind.
#[must_use]
pub fn order_message(kind: NotificationKind, ctx: &OrderContext<'_>) -> NotificationText {
    let order = ctx.order_id.reference();
    let product = ctx.product;
    match kind {
        NotificationKind::OrderConfirmed => NotificationText::new(
            "Order Confirmed",
            format!(
                "Your order {order} for {product} has been confirmed. Please complete payment to proceed."
            ),
        ),
        NotificationKind::OrderRejected => NotificationText::new(
            "Order Declined",
            format!("Your order {order} for {product} has been declined."),
        ),
        NotificationKind::PaymentUploaded => NotificationText::new(
            "Payment Proof Uploaded",
            format!(
                "{} ({}) uploaded payment proof for order {order}",
                ctx.actor_name, ctx.actor_role
            ),
        ),
        NotificationKind::PaymentVerified => NotificationText::new(
            "Payment Verified - Delivery in Progress",
            format!(
                "Your payment for order {order} has been verified. Your order is being processed and will be shipped soon!"
            ),
        ),
        NotificationKind::PaymentRejected => NotificationText::new(
            "Payment Rejected",
            format!(
                "Your payment for order {order} was rejected. Please contact support or upload a valid payment proof."
            ),
        ),
        NotificationKind::OrderDelivered => NotificationText::new(
            "Order Delivered Successfully",
            format!(
                "Your order {order} for {product} has been delivered successfully! Thank you for your business."
            ),
        ),
        NotificationKind::AccountApproved => account_approved_message(),
    }
}

/// Wording for the account approval notification.
#[must_use]
pub fn account_approved_message() -> NotificationText {
    NotificationText::new(
        "Account Approved",
        "Your account has been approved! You can now log in and access the platform.".to_string(),
    )
}

/// Records notifications for recipients.
#[derive(Debug, Clone)]
pub struct NotificationEmitter<S> {
    store: S,
}

impl<S> NotificationEmitter<S>
where
    S: NotificationStore + UserStore,
{
    /// Create an emitter writing to `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a notification for one recipient.
    ///
    /// Returns `None` when the recipient does not exist or the write failed.
    #[instrument(skip(self, message), fields(recipient = %recipient, kind = %kind))]
    pub async fn emit(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        message: NotificationText,
        order_id: Option<OrderId>,
    ) -> Option<Notification> {
        let input = NewNotification {
            user_id: recipient,
            order_id,
            kind,
            title: message.title,
            message: message.body,
        };

        match self.store.insert_notification(&input).await {
            Ok(Some(notification)) => Some(notification),
            Ok(None) => {
                debug!("Recipient does not exist, notification skipped");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to record notification");
                None
            }
        }
    }

    /// Record a notification for every admin and super admin except `except`.
    ///
    /// Returns how many notifications were recorded.
    #[instrument(skip(self, message), fields(kind = %kind))]
    pub async fn emit_to_staff(
        &self,
        except: UserId,
        kind: NotificationKind,
        message: NotificationText,
        order_id: Option<OrderId>,
    ) -> usize {
        let recipients = match self.store.staff_ids(except).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "Failed to resolve staff recipients");
                return 0;
            }
        };

        let mut sent = 0;
        for recipient in recipients {
            if self
                .emit(recipient, kind, message.clone(), order_id)
                .await
                .is_some()
            {
                sent += 1;
            }
        }
        sent
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use supplyhub_core::Email;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewUser;

    fn ctx(product: &str) -> OrderContext<'_> {
        OrderContext {
            order_id: OrderId::new(42),
            product,
            actor_name: "Acme Builders",
            actor_role: Role::User,
        }
    }

    async fn user(store: &MemoryStore, email: &str, role: Role) -> UserId {
        store
            .create_user(&NewUser {
                email: Email::parse(email).unwrap(),
                name: email.to_string(),
                role,
                is_approved: true,
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn test_confirmed_wording() {
        let message = order_message(NotificationKind::OrderConfirmed, &ctx("Cement"));
        assert_eq!(message.title, "Order Confirmed");
        assert_eq!(
            message.body,
            "Your order #000042 for Cement has been confirmed. Please complete payment to proceed."
        );
    }

    #[test]
    fn test_upload_wording_names_actor() {
        let message = order_message(NotificationKind::PaymentUploaded, &ctx("Cement"));
        assert_eq!(
            message.body,
            "Acme Builders (USER) uploaded payment proof for order #000042"
        );
    }

    #[test]
    fn test_payment_rejected_wording() {
        let message = order_message(NotificationKind::PaymentRejected, &ctx("Cement"));
        assert_eq!(message.title, "Payment Rejected");
        assert_eq!(
            message.body,
            "Your payment for order #000042 was rejected. Please contact support or upload a valid payment proof."
        );
    }

    #[test]
    fn test_every_kind_has_a_title() {
        for kind in [
            NotificationKind::OrderConfirmed,
            NotificationKind::OrderRejected,
            NotificationKind::PaymentUploaded,
            NotificationKind::PaymentVerified,
            NotificationKind::PaymentRejected,
            NotificationKind::OrderDelivered,
            NotificationKind::AccountApproved,
        ] {
            assert!(!order_message(kind, &ctx("Cement")).title.is_empty());
        }
    }

    #[tokio::test]
    async fn test_missing_recipient_is_a_no_op() {
        let store = MemoryStore::new();
        let emitter = NotificationEmitter::new(store.clone());
        let result = emitter
            .emit(
                UserId::new(404),
                NotificationKind::AccountApproved,
                account_approved_message(),
                None,
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_is_swallowed() {
        let store = MemoryStore::new();
        let buyer = user(&store, "buyer@example.com", Role::User).await;
        store.fail_notification_writes(true);

        let emitter = NotificationEmitter::new(store.clone());
        let result = emitter
            .emit(
                buyer,
                NotificationKind::AccountApproved,
                account_approved_message(),
                None,
            )
            .await;
        assert!(result.is_none());
        assert_eq!(store.unread_count(buyer).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_staff_fan_out_skips_actor() {
        let store = MemoryStore::new();
        let admin = user(&store, "admin@example.com", Role::Admin).await;
        let root = user(&store, "root@example.com", Role::SuperAdmin).await;
        let other = user(&store, "ops@example.com", Role::Admin).await;

        let emitter = NotificationEmitter::new(store.clone());
        let sent = emitter
            .emit_to_staff(
                admin,
                NotificationKind::PaymentUploaded,
                order_message(NotificationKind::PaymentUploaded, &ctx("Cement")),
                Some(OrderId::new(42)),
            )
            .await;

        assert_eq!(sent, 2);
        assert_eq!(store.unread_count(admin).await.unwrap(), 0);
        assert_eq!(store.unread_count(root).await.unwrap(), 1);
        assert_eq!(store.unread_count(other).await.unwrap(), 1);
    }
}
