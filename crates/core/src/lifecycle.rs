//! Order lifecycle state machine.
//!
//! An order's state is the combination of its [`OrderStatus`], its
//! [`DeliveryStatus`], whether a payment proof has been attached and whether
//! that proof has been verified. [`OrderState::apply`] is the only place that
//! decides which actions are legal from which state, what the next state is,
//! and which side effects the persistence layer must carry out.
//!
//! ```text
//! created            PENDING   / NOT_SHIPPED
//! Approve            PENDING   -> APPROVED  / PENDING_PAYMENT
//! Decline            PENDING   -> REJECTED  / NOT_SHIPPED           (terminal)
//! UploadProof        APPROVED  / PENDING_PAYMENT, proof attached
//! ApprovePayment     APPROVED  / PENDING_PAYMENT [proof] -> APPROVED / DELIVERY_IN_PROGRESS
//! RejectPayment      APPROVED  / PENDING_PAYMENT [proof] -> REJECTED / PAYMENT_REJECTED (terminal)
//! MarkDelivered      APPROVED  / DELIVERY_IN_PROGRESS -> DELIVERED / DELIVERED (terminal, stock -n)
//! ```
//!
//! Stock is decremented on `MarkDelivered` and nowhere else.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryStatus, NotificationKind, OrderStatus};

/// An action requested against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Staff confirms a pending order.
    Approve,
    /// Staff declines a pending order.
    Decline,
    /// The owner attaches (or replaces) a payment proof.
    UploadProof,
    /// Staff accepts the attached payment proof.
    ApprovePayment,
    /// Staff rejects the attached payment proof.
    RejectPayment,
    /// Staff confirms the goods arrived.
    MarkDelivered,
}

impl OrderAction {
    /// Every action, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Approve,
        Self::Decline,
        Self::UploadProof,
        Self::ApprovePayment,
        Self::RejectPayment,
        Self::MarkDelivered,
    ];

    /// Human-readable verb used in error messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Decline => "decline",
            Self::UploadProof => "upload a payment proof for",
            Self::ApprovePayment => "verify the payment of",
            Self::RejectPayment => "reject the payment of",
            Self::MarkDelivered => "mark as delivered",
        }
    }
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Who receives the notification produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTarget {
    /// The user who placed the order.
    Owner,
    /// Every admin and super admin except the acting user.
    Staff,
}

/// The mutable lifecycle fields of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderState {
    /// Approval state.
    pub status: OrderStatus,
    /// Payment and fulfillment sub-state.
    pub delivery_status: DeliveryStatus,
    /// Whether staff accepted the payment proof. Never reverts to `false`.
    pub payment_verified: bool,
    /// Whether the owner attached a payment proof.
    pub has_payment_proof: bool,
}

impl Default for OrderState {
    fn default() -> Self {
        Self::created()
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.status, self.delivery_status)
    }
}

/// The outcome of a legal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The action that was applied.
    pub action: OrderAction,
    /// State before the action.
    pub from: OrderState,
    /// State after the action.
    pub to: OrderState,
    /// Whether the product stock must be decremented by the order quantity
    /// in the same atomic write.
    pub decrements_stock: bool,
    /// Notification emitted after the write commits.
    pub notification: NotificationKind,
    /// Recipients of that notification.
    pub notify: NotificationTarget,
}

/// An action that the current state does not permit.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot {action} an order that is {from}")]
pub struct TransitionError {
    /// State the action was attempted from.
    pub from: OrderState,
    /// The rejected action.
    pub action: OrderAction,
}

impl OrderState {
    /// State of a freshly placed order.
    #[must_use]
    pub const fn created() -> Self {
        Self {
            status: OrderStatus::Pending,
            delivery_status: DeliveryStatus::NotShipped,
            payment_verified: false,
            has_payment_proof: false,
        }
    }

    /// Whether no further action is accepted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether `status`, `delivery_status` and the payment flags agree.
    ///
    /// Every state reachable through [`OrderState::apply`] is consistent.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        let verified = self.payment_verified;
        let proof = self.has_payment_proof;
        match (self.status, self.delivery_status) {
            (OrderStatus::Pending | OrderStatus::Rejected, DeliveryStatus::NotShipped) => {
                !verified && !proof
            }
            (OrderStatus::Approved, DeliveryStatus::PendingPayment) => !verified,
            (OrderStatus::Approved, DeliveryStatus::DeliveryInProgress)
            | (OrderStatus::Delivered, DeliveryStatus::Delivered) => verified && proof,
            (OrderStatus::Rejected, DeliveryStatus::PaymentRejected) => !verified && proof,
            _ => false,
        }
    }

    /// Whether the order is waiting on (or reviewing) the owner's payment.
    const fn awaiting_payment(&self) -> bool {
        matches!(self.status, OrderStatus::Approved)
            && matches!(self.delivery_status, DeliveryStatus::PendingPayment)
            && !self.payment_verified
    }

    /// Apply `action` to this state.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the action is not legal from this state.
    /// Terminal states reject every action.
    pub const fn apply(self, action: OrderAction) -> Result<Transition, TransitionError> {
        let reject = Err(TransitionError { from: self, action });
        let pending = matches!(self.status, OrderStatus::Pending);

        let (to, notification, notify) = match action {
            OrderAction::Approve if pending => (
                Self {
                    status: OrderStatus::Approved,
                    delivery_status: DeliveryStatus::PendingPayment,
                    ..self
                },
                NotificationKind::OrderConfirmed,
                NotificationTarget::Owner,
            ),
            OrderAction::Decline if pending => (
                Self {
                    status: OrderStatus::Rejected,
                    delivery_status: DeliveryStatus::NotShipped,
                    ..self
                },
                NotificationKind::OrderRejected,
                NotificationTarget::Owner,
            ),
            OrderAction::UploadProof if self.awaiting_payment() => (
                Self {
                    has_payment_proof: true,
                    ..self
                },
                NotificationKind::PaymentUploaded,
                NotificationTarget::Staff,
            ),
            OrderAction::ApprovePayment if self.awaiting_payment() && self.has_payment_proof => (
                Self {
                    status: OrderStatus::Approved,
                    delivery_status: DeliveryStatus::DeliveryInProgress,
                    payment_verified: true,
                    ..self
                },
                NotificationKind::PaymentVerified,
                NotificationTarget::Owner,
            ),
            OrderAction::RejectPayment if self.awaiting_payment() && self.has_payment_proof => (
                Self {
                    status: OrderStatus::Rejected,
                    delivery_status: DeliveryStatus::PaymentRejected,
                    payment_verified: false,
                    ..self
                },
                NotificationKind::PaymentRejected,
                NotificationTarget::Owner,
            ),
            OrderAction::MarkDelivered
                if matches!(self.status, OrderStatus::Approved)
                    && matches!(self.delivery_status, DeliveryStatus::DeliveryInProgress)
                    && self.payment_verified =>
            {
                (
                    Self {
                        status: OrderStatus::Delivered,
                        delivery_status: DeliveryStatus::Delivered,
                        ..self
                    },
                    NotificationKind::OrderDelivered,
                    NotificationTarget::Owner,
                )
            }
            _ => return reject,
        };

        Ok(Transition {
            action,
            from: self,
            to,
            decrements_stock: matches!(action, OrderAction::MarkDelivered),
            notification,
            notify,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;

    fn run(actions: &[OrderAction]) -> OrderState {
        actions
            .iter()
            .fold(OrderState::created(), |state, &action| {
                state.apply(action).unwrap().to
            })
    }

    /// Every state reachable from a new order, found by breadth-first search.
    fn reachable() -> HashSet<OrderState> {
        let mut seen = HashSet::from([OrderState::created()]);
        let mut queue = VecDeque::from([OrderState::created()]);
        while let Some(state) = queue.pop_front() {
            for action in OrderAction::ALL {
                if let Ok(t) = state.apply(action)
                    && seen.insert(t.to)
                {
                    queue.push_back(t.to);
                }
            }
        }
        seen
    }

    #[test]
    fn test_created_state() {
        let state = OrderState::created();
        assert_eq!(state.status, OrderStatus::Pending);
        assert_eq!(state.delivery_status, DeliveryStatus::NotShipped);
        assert!(!state.payment_verified);
        assert!(!state.has_payment_proof);
    }

    #[test]
    fn test_approve_moves_to_pending_payment() {
        let t = OrderState::created().apply(OrderAction::Approve).unwrap();
        assert_eq!(t.to.status, OrderStatus::Approved);
        assert_eq!(t.to.delivery_status, DeliveryStatus::PendingPayment);
        assert_eq!(t.notification, NotificationKind::OrderConfirmed);
        assert_eq!(t.notify, NotificationTarget::Owner);
        assert!(!t.decrements_stock);
    }

    #[test]
    fn test_decline_is_terminal() {
        let state = run(&[OrderAction::Decline]);
        assert_eq!(state.status, OrderStatus::Rejected);
        assert_eq!(state.delivery_status, DeliveryStatus::NotShipped);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_upload_keeps_statuses_and_notifies_staff() {
        let before = run(&[OrderAction::Approve]);
        let t = before.apply(OrderAction::UploadProof).unwrap();
        assert_eq!(t.to.status, before.status);
        assert_eq!(t.to.delivery_status, before.delivery_status);
        assert!(t.to.has_payment_proof);
        assert_eq!(t.notify, NotificationTarget::Staff);
    }

    #[test]
    fn test_proof_can_be_replaced_before_review() {
        let state = run(&[OrderAction::Approve, OrderAction::UploadProof]);
        assert!(state.apply(OrderAction::UploadProof).is_ok());
    }

    #[test]
    fn test_upload_requires_approval() {
        let err = OrderState::created()
            .apply(OrderAction::UploadProof)
            .unwrap_err();
        assert_eq!(err.action, OrderAction::UploadProof);
        assert_eq!(err.from, OrderState::created());
    }

    #[test]
    fn test_verification_requires_proof() {
        let state = run(&[OrderAction::Approve]);
        assert!(state.apply(OrderAction::ApprovePayment).is_err());
        assert!(state.apply(OrderAction::RejectPayment).is_err());
    }

    #[test]
    fn test_payment_rejection_is_terminal() {
        let state = run(&[
            OrderAction::Approve,
            OrderAction::UploadProof,
            OrderAction::RejectPayment,
        ]);
        assert_eq!(state.status, OrderStatus::Rejected);
        assert_eq!(state.delivery_status, DeliveryStatus::PaymentRejected);
        assert!(!state.payment_verified);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_verified_payment_cannot_be_verified_again() {
        let state = run(&[
            OrderAction::Approve,
            OrderAction::UploadProof,
            OrderAction::ApprovePayment,
        ]);
        assert!(state.payment_verified);
        assert!(state.apply(OrderAction::ApprovePayment).is_err());
        assert!(state.apply(OrderAction::RejectPayment).is_err());
        assert!(state.apply(OrderAction::UploadProof).is_err());
    }

    #[test]
    fn test_only_delivery_decrements_stock() {
        let mut state = OrderState::created();
        let path = [
            OrderAction::Approve,
            OrderAction::UploadProof,
            OrderAction::ApprovePayment,
            OrderAction::MarkDelivered,
        ];
        for action in path {
            let t = state.apply(action).unwrap();
            assert_eq!(t.decrements_stock, action == OrderAction::MarkDelivered);
            state = t.to;
        }
        assert_eq!(state.status, OrderStatus::Delivered);
        assert_eq!(state.delivery_status, DeliveryStatus::Delivered);
    }

    #[test]
    fn test_delivery_requires_verified_payment() {
        let state = run(&[OrderAction::Approve, OrderAction::UploadProof]);
        assert!(state.apply(OrderAction::MarkDelivered).is_err());
    }

    #[test]
    fn test_every_reachable_state_is_consistent() {
        let states = reachable();
        assert_eq!(states.len(), 7);
        for state in states {
            assert!(state.is_consistent(), "inconsistent state reached: {state:?}");
        }
    }

    #[test]
    fn test_terminal_states_reject_every_action() {
        for state in reachable().into_iter().filter(OrderState::is_terminal) {
            for action in OrderAction::ALL {
                assert!(state.apply(action).is_err(), "{state} accepted {action:?}");
            }
        }
    }

    #[test]
    fn test_inconsistent_states_detected() {
        let state = OrderState {
            status: OrderStatus::Pending,
            delivery_status: DeliveryStatus::DeliveryInProgress,
            payment_verified: false,
            has_payment_proof: false,
        };
        assert!(!state.is_consistent());
    }

    #[test]
    fn test_error_message() {
        let err = run(&[OrderAction::Decline])
            .apply(OrderAction::Approve)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot approve an order that is REJECTED/NOT_SHIPPED"
        );
    }
}
