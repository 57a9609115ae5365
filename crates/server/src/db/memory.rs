//! In-process store backend.
//!
//! Every operation takes one lock over all tables, so a transition and its
//! stock decrement are observed together or not at all, exactly as with the
//! `PostgreSQL` transaction.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;

use supplyhub_core::{MessageId, NotificationId, OrderId, ProductId, Role, UserId};

use super::{
    CommitOutcome, MessageStore, NotificationStore, OrderStore, ProductStore, RepositoryError, Store,
    TransitionCommit, UserStore,
};
use crate::models::{
    Message, NewMessage, NewNotification, NewOrder, NewProduct, NewUser, Notification, Order,
    OrderFilter, Participant, Product, ProductFilter, ProductUpdate, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    notifications: BTreeMap<NotificationId, Notification>,
    messages: BTreeMap<MessageId, Message>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store that keeps every table in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_notifications: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent notification write fail with a database error.
    ///
    /// Used to check that a failed notification never undoes an order change.
    pub fn fail_notification_writes(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }
}

/// Sort newest first, breaking timestamp ties by ID.
fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl ProductStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let tables = self.tables.lock().await;
        let mut matches: Vec<Product> = tables
            .products
            .values()
            .filter(|p| {
                needle.as_deref().is_none_or(|needle| {
                    p.name.to_lowercase().contains(needle)
                        || p.description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(needle))
                })
            })
            .cloned()
            .collect();
        drop(tables);

        newest_first(&mut matches, |p| (p.created_at, p.id));
        let total = i64::try_from(matches.len()).unwrap_or(i64::MAX);
        let page = matches
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        if input.quantity < 0 {
            return Err(RepositoryError::Conflict(
                "product quantity must not be negative".to_string(),
            ));
        }

        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(tables.next_id()),
            name: input.name.clone(),
            kind: input.kind.clone(),
            location: input.location.clone(),
            description: input.description.clone(),
            price: input.price,
            quantity: input.quantity,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        if input.quantity.is_some_and(|q| q < 0) {
            return Err(RepositoryError::Conflict(
                "product quantity must not be negative".to_string(),
            ));
        }

        let mut tables = self.tables.lock().await;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &input.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &input.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = input.price {
            product.price = price;
        }
        if let Some(quantity) = input.quantity {
            product.quantity = quantity;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }
}

impl UserStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn create_user(&self, input: &NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }

        let user = User {
            id: UserId::new(tables.next_id()),
            email: input.email.clone(),
            name: input.name.clone(),
            role: input.role,
            is_approved: input.is_approved,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self, roles: Option<&[Role]>) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self
            .tables
            .lock()
            .await
            .users
            .values()
            .filter(|u| roles.is_none_or(|roles| roles.contains(&u.role)))
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_at, u.id));
        Ok(users)
    }

    async fn staff_ids(&self, except: UserId) -> Result<Vec<UserId>, RepositoryError> {
        Ok(self
            .tables
            .lock()
            .await
            .users
            .values()
            .filter(|u| u.role.is_staff() && u.id != except)
            .map(|u| u.id)
            .collect())
    }

    async fn approve_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            let before = user.clone();
            user.is_approved = true;
            before
        }))
    }
}

impl OrderStore for MemoryStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .tables
            .lock()
            .await
            .orders
            .values()
            .filter(|o| filter.user_id.is_none_or(|id| o.user_id == id))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        newest_first(&mut orders, |o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn insert_order(&self, input: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&input.user_id)
            || !tables.products.contains_key(&input.product_id)
        {
            return Err(RepositoryError::NotFound);
        }

        let state = supplyhub_core::OrderState::created();
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(tables.next_id()),
            user_id: input.user_id,
            product_id: input.product_id,
            quantity: input.quantity,
            total_price: input.total_price,
            status: state.status,
            delivery_status: state.delivery_status,
            payment_proof: None,
            payment_verified: state.payment_verified,
            created_at: now,
            updated_at: now,
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn commit_transition(
        &self,
        commit: &TransitionCommit<'_>,
    ) -> Result<CommitOutcome, RepositoryError> {
        let mut tables = self.tables.lock().await;

        match tables.orders.get(&commit.order_id) {
            Some(order)
                if order.state() == commit.expected
                    && order.payment_proof.as_deref() == commit.expected_proof => {}
            _ => return Ok(CommitOutcome::Conflict),
        }

        if let Some(decrement) = commit.stock_decrement {
            let available = tables
                .products
                .get(&decrement.product_id)
                .map_or(0, |p| p.quantity);
            if available < decrement.quantity {
                return Ok(CommitOutcome::InsufficientStock { available });
            }
            if let Some(product) = tables.products.get_mut(&decrement.product_id) {
                product.quantity -= decrement.quantity;
                product.updated_at = Utc::now();
            }
        }

        let Some(order) = tables.orders.get_mut(&commit.order_id) else {
            return Ok(CommitOutcome::Conflict);
        };
        order.status = commit.next.status;
        order.delivery_status = commit.next.delivery_status;
        order.payment_verified = commit.next.payment_verified;
        if let Some(proof) = commit.payment_proof {
            order.payment_proof = Some(proof.to_string());
        }
        order.updated_at = Utc::now();
        Ok(CommitOutcome::Applied(order.clone()))
    }
}

impl NotificationStore for MemoryStore {
    async fn insert_notification(
        &self,
        input: &NewNotification,
    ) -> Result<Option<Notification>, RepositoryError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&input.user_id) {
            return Ok(None);
        }

        let notification = Notification {
            id: NotificationId::new(tables.next_id()),
            user_id: input.user_id,
            order_id: input.order_id,
            kind: input.kind,
            title: input.title.clone(),
            message: input.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        tables
            .notifications
            .insert(notification.id, notification.clone());
        Ok(Some(notification))
    }

    async fn list_notifications(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let mut inbox: Vec<Notification> = self
            .tables
            .lock()
            .await
            .notifications
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut inbox, |n| (n.created_at, n.id));
        inbox.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(inbox)
    }

    async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = self
            .tables
            .lock()
            .await
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.notifications.get_mut(&id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let mut changed = 0;
        for n in tables
            .notifications
            .values_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}

impl MessageStore for MemoryStore {
    async fn insert_message(&self, input: &NewMessage) -> Result<Option<Message>, RepositoryError> {
        let mut tables = self.tables.lock().await;
        let (Some(sender), Some(receiver)) = (
            tables.users.get(&input.sender_id).map(Participant::from),
            tables.users.get(&input.receiver_id).map(Participant::from),
        ) else {
            return Ok(None);
        };

        let message = Message {
            id: MessageId::new(tables.next_id()),
            sender,
            receiver,
            message: input.message.clone(),
            is_read: false,
            created_at: Utc::now(),
        };
        tables.messages.insert(message.id, message.clone());
        Ok(Some(message))
    }

    async fn list_messages(
        &self,
        user_id: UserId,
        with: Option<UserId>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let tables = self.tables.lock().await;
        let involves = |m: &Message, a: UserId, b: UserId| m.sender.id == a && m.receiver.id == b;

        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|m| match with {
                Some(other) => involves(m, user_id, other) || involves(m, other, user_id),
                None => m.sender.id == user_id || m.receiver.id == user_id,
            })
            .cloned()
            .collect();

        if with.is_some() {
            messages.sort_by_key(|m| (m.created_at, m.id));
        } else {
            newest_first(&mut messages, |m| (m.created_at, m.id));
        }
        Ok(messages)
    }

    async fn mark_message_read(
        &self,
        id: MessageId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.messages.get_mut(&id) {
            Some(message) if message.receiver.id == user_id => {
                message.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
