//! Business logic services.
//!
//! # Services
//!
//! - `lifecycle` - Order Lifecycle Engine: validates and commits order transitions
//! - `notifications` - Best-effort notification emitter and message wording
//! - `accounts` - Account approval by super admins and the account directory
//! - `messages` - Direct messages between accounts

pub mod accounts;
pub mod lifecycle;
pub mod messages;
pub mod notifications;

use thiserror::Error;

use supplyhub_core::{OrderAction, OrderState, TransitionError};

use crate::db::RepositoryError;

pub use accounts::{AccountService, Approval};
pub use lifecycle::{Decision, OrderLifecycle};
pub use messages::MessageService;
pub use notifications::NotificationEmitter;

/// Errors returned by lifecycle, account and message operations.
///
/// None of these are retried; they are reported to the caller as-is.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Order, product or user does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The actor lacks the role or ownership the action requires.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The order's current state does not permit the action.
    #[error("cannot {action} an order that is {from}")]
    InvalidTransition {
        from: OrderState,
        action: OrderAction,
    },

    /// Not enough stock to place or fulfil the order.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i32, available: i32 },

    /// Order quantity must be a positive number of units.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i32),

    /// Quantity times unit price exceeds the largest representable amount.
    #[error("order total for {quantity} units exceeds the maximum price")]
    TotalTooLarge { quantity: i32 },

    /// A payment proof reference must not be blank.
    #[error("payment proof must not be empty")]
    EmptyPaymentProof,

    /// A message body must not be blank.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<TransitionError> for LifecycleError {
    fn from(err: TransitionError) -> Self {
        Self::InvalidTransition {
            from: err.from,
            action: err.action,
        }
    }
}
