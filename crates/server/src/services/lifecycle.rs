//! Order Lifecycle Engine.
//!
//! Every mutating operation follows the same sequence:
//!
//! 1. Role check (`Forbidden`)
//! 2. Load the order (`NotFound`)
//! 3. Ownership check (`Forbidden`)
//! 4. Look the action up in the transition table (`InvalidTransition`)
//! 5. Commit state and stock atomically, conditional on the state read in 2
//! 6. Emit the notification, best-effort
//!
//! A caller that loses a race at step 5 gets `InvalidTransition`, so stock is
//! decremented and notifications are sent at most once per transition.

use tracing::{info, instrument, warn};

use supplyhub_core::{
    Actor, NotificationTarget, OrderAction, OrderId, OrderStatus, ProductId, Transition,
};

use super::LifecycleError;
use super::notifications::{NotificationEmitter, OrderContext, order_message};
use crate::db::{CommitOutcome, RepositoryError, StockDecrement, Store, TransitionCommit};
use crate::models::{NewOrder, Order, OrderFilter};

/// An approve-or-reject decision made by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Validates and applies order transitions.
#[derive(Debug, Clone)]
pub struct OrderLifecycle<S> {
    store: S,
    notifier: NotificationEmitter<S>,
}

impl<S: Store> OrderLifecycle<S> {
    /// Create an engine over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            notifier: NotificationEmitter::new(store.clone()),
            store,
        }
    }

    /// Place an order for `quantity` units of a product.
    ///
    /// The total is fixed here from the current product price. Stock is
    /// checked but not decremented.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is not positive
    /// - `NotFound` if the product or the actor's account does not exist
    /// - `InsufficientStock` if the product has fewer units than requested
    /// - `TotalTooLarge` if the total would exceed the maximum price
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn create_order(
        &self,
        actor: Actor,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Order, LifecycleError> {
        let units = u32::try_from(quantity)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(LifecycleError::InvalidQuantity(quantity))?;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("product {product_id}")))?;

        if product.quantity < quantity {
            return Err(LifecycleError::InsufficientStock {
                requested: quantity,
                available: product.quantity,
            });
        }

        let total_price = product
            .price
            .total_for(units)
            .map_err(|_| LifecycleError::TotalTooLarge { quantity })?;

        let order = self
            .store
            .insert_order(&NewOrder {
                user_id: actor.id,
                product_id,
                quantity,
                total_price,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    LifecycleError::NotFound(format!("user {} or product {product_id}", actor.id))
                }
                other => other.into(),
            })?;

        info!(order_id = %order.id, total = %order.total_price, "Order placed");
        Ok(order)
    }

    /// Approve or decline a pending order.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not staff
    /// - `NotFound` if the order does not exist
    /// - `InvalidTransition` if the order is no longer pending
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn decide(
        &self,
        actor: Actor,
        order_id: OrderId,
        decision: Decision,
    ) -> Result<Order, LifecycleError> {
        let action = match decision {
            Decision::Approve => OrderAction::Approve,
            Decision::Reject => OrderAction::Decline,
        };
        self.run(actor, order_id, action, None).await
    }

    /// Attach (or replace) the payment proof on an approved order.
    ///
    /// # Errors
    ///
    /// - `EmptyPaymentProof` if `proof` is blank
    /// - `NotFound` if the order does not exist
    /// - `Forbidden` if the actor does not own the order
    /// - `InvalidTransition` unless the order awaits payment
    #[instrument(skip(self, proof), fields(actor = %actor.id))]
    pub async fn upload_payment_proof(
        &self,
        actor: Actor,
        order_id: OrderId,
        proof: &str,
    ) -> Result<Order, LifecycleError> {
        let proof = proof.trim();
        if proof.is_empty() {
            return Err(LifecycleError::EmptyPaymentProof);
        }
        self.run(actor, order_id, OrderAction::UploadProof, Some(proof))
            .await
    }

    /// Accept or reject the attached payment proof.
    ///
    /// A payment can be verified once. Verifying again is an
    /// `InvalidTransition`.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not staff
    /// - `NotFound` if the order does not exist
    /// - `InvalidTransition` unless a proof is attached and not yet verified
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn verify_payment(
        &self,
        actor: Actor,
        order_id: OrderId,
        decision: Decision,
    ) -> Result<Order, LifecycleError> {
        let action = match decision {
            Decision::Approve => OrderAction::ApprovePayment,
            Decision::Reject => OrderAction::RejectPayment,
        };
        self.run(actor, order_id, action, None).await
    }

    /// Confirm delivery and take the ordered units out of stock.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the actor is not staff
    /// - `NotFound` if the order does not exist
    /// - `InvalidTransition` unless delivery is in progress
    /// - `InsufficientStock` if stock fell below the order quantity since it
    ///   was placed; nothing is written
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn mark_delivered(
        &self,
        actor: Actor,
        order_id: OrderId,
    ) -> Result<Order, LifecycleError> {
        self.run(actor, order_id, OrderAction::MarkDelivered, None)
            .await
    }

    /// Fetch one order. Customers may only see their own.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `Forbidden` if a customer asks for someone else's order
    pub async fn get_order(&self, actor: Actor, order_id: OrderId) -> Result<Order, LifecycleError> {
        let order = self.load(order_id).await?;
        if !actor.is_staff() && !actor.is(order.user_id) {
            return Err(LifecycleError::Forbidden(format!(
                "order {order_id} belongs to another user"
            )));
        }
        Ok(order)
    }

    /// List orders, newest first. Customers only see their own.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn list_orders(
        &self,
        actor: Actor,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, LifecycleError> {
        let filter = OrderFilter {
            user_id: (!actor.is_staff()).then_some(actor.id),
            status,
        };
        Ok(self.store.list_orders(&filter).await?)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, LifecycleError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("order {order_id}")))
    }

    async fn run(
        &self,
        actor: Actor,
        order_id: OrderId,
        action: OrderAction,
        proof: Option<&str>,
    ) -> Result<Order, LifecycleError> {
        let owner_action = matches!(action, OrderAction::UploadProof);
        if !owner_action && !actor.is_staff() {
            return Err(LifecycleError::Forbidden(format!(
                "only staff may {action} an order"
            )));
        }

        let order = self.load(order_id).await?;

        if owner_action && !actor.is(order.user_id) {
            return Err(LifecycleError::Forbidden(format!(
                "only the owner may {action} order {order_id}"
            )));
        }

        let transition = order.state().apply(action)?;

        let commit = TransitionCommit {
            order_id,
            expected: transition.from,
            expected_proof: order.payment_proof.as_deref(),
            next: transition.to,
            payment_proof: proof,
            stock_decrement: transition.decrements_stock.then_some(StockDecrement {
                product_id: order.product_id,
                quantity: order.quantity,
            }),
        };

        let updated = match self.store.commit_transition(&commit).await? {
            CommitOutcome::Applied(updated) => updated,
            CommitOutcome::Conflict => {
                let current = self.load(order_id).await?;
                info!(%order_id, state = %current.state(), "Lost race for order transition");
                return Err(LifecycleError::InvalidTransition {
                    from: current.state(),
                    action,
                });
            }
            CommitOutcome::InsufficientStock { available } => {
                warn!(
                    %order_id,
                    product_id = %order.product_id,
                    requested = order.quantity,
                    available,
                    "Stock depleted before delivery"
                );
                return Err(LifecycleError::InsufficientStock {
                    requested: order.quantity,
                    available,
                });
            }
        };

        info!(%order_id, from = %transition.from, to = %transition.to, "Order transition applied");

        self.notify(actor, &updated, &transition).await;
        Ok(updated)
    }

    async fn notify(&self, actor: Actor, order: &Order, transition: &Transition) {
        let product = match self.store.get_product(order.product_id).await {
            Ok(Some(product)) => product.name,
            Ok(None) | Err(_) => format!("product {}", order.product_id),
        };
        let actor_name = match self.store.get_user(actor.id).await {
            Ok(Some(user)) => user.name,
            Ok(None) | Err(_) => format!("user {}", actor.id),
        };

        let message = order_message(
            transition.notification,
            &OrderContext {
                order_id: order.id,
                product: &product,
                actor_name: &actor_name,
                actor_role: actor.role,
            },
        );

        match transition.notify {
            NotificationTarget::Owner => {
                self.notifier
                    .emit(order.user_id, transition.notification, message, Some(order.id))
                    .await;
            }
            NotificationTarget::Staff => {
                self.notifier
                    .emit_to_staff(actor.id, transition.notification, message, Some(order.id))
                    .await;
            }
        }
    }
}
