//! Persistence for the ordering platform.
//!
//! # Tables
//!
//! - `users` - Platform accounts and their roles
//! - `products` - Catalog items and stock counts
//! - `orders` - Orders and their lifecycle fields
//! - `notifications` - Per-recipient notification inbox
//! - `messages` - Direct messages between accounts
//!
//! # Backends
//!
//! The services and handlers are written against the store traits below.
//! [`PgStore`] is the production `PostgreSQL` backend; [`MemoryStore`] keeps
//! everything in process memory with the same atomicity guarantees and backs
//! the test suites and `sh-cli demo`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p supplyhub-cli -- migrate
//! ```

pub mod memory;
pub mod messages;
pub mod notifications;
pub mod orders;
pub mod pg;
pub mod products;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use supplyhub_core::{MessageId, NotificationId, OrderId, OrderState, ProductId, Role, UserId};

use crate::models::{
    Message, NewMessage, NewNotification, NewOrder, NewProduct, NewUser, Notification, Order,
    OrderFilter, Product, ProductFilter, ProductUpdate, User,
};

pub use memory::MemoryStore;
pub use messages::MessageRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use pg::PgStore;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// A stock reduction that must commit together with an order transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// An atomic, optimistically checked order state change.
///
/// The write only applies if the stored order still matches `expected` and
/// still carries `expected_proof`.
#[derive(Debug, Clone)]
pub struct TransitionCommit<'a> {
    pub order_id: OrderId,
    /// State the caller validated the transition against.
    pub expected: OrderState,
    /// Payment proof the caller saw when it read the order.
    pub expected_proof: Option<&'a str>,
    /// State to write.
    pub next: OrderState,
    /// Payment proof to store, if the transition attaches one.
    pub payment_proof: Option<&'a str>,
    /// Stock to take in the same transaction.
    pub stock_decrement: Option<StockDecrement>,
}

/// Result of [`OrderStore::commit_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The transition was written.
    Applied(Order),
    /// The order changed (or vanished) since it was read. Nothing was written.
    Conflict,
    /// Not enough stock for the decrement. Nothing was written.
    InsufficientStock {
        /// Units on hand when the decrement was attempted.
        available: i32,
    },
}

/// Catalog persistence.
pub trait ProductStore: Send + Sync {
    /// Get a product by ID.
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// List products matching `filter`, newest first, with the total match count.
    fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> impl Future<Output = Result<(Vec<Product>, i64), RepositoryError>> + Send;

    /// Create a product.
    fn create_product(
        &self,
        input: &NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Apply a partial update. Returns `None` if the product does not exist.
    fn update_product(
        &self,
        id: ProductId,
        input: &ProductUpdate,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;
}

/// Account persistence.
pub trait UserStore: Send + Sync {
    /// Get a user by ID.
    fn get_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Create a user. Returns `Conflict` if the email is taken.
    fn create_user(
        &self,
        input: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Accounts newest first. `None` lists every role.
    fn list_users(
        &self,
        roles: Option<&[Role]>,
    ) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// IDs of every admin and super admin except `except`.
    fn staff_ids(
        &self,
        except: UserId,
    ) -> impl Future<Output = Result<Vec<UserId>, RepositoryError>> + Send;

    /// Mark an account approved. Returns the user as it was before the
    /// update, or `None` if it does not exist.
    fn approve_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;
}

/// Order persistence.
pub trait OrderStore: Send + Sync {
    /// Get an order by ID.
    fn get_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// List orders matching `filter`, newest first.
    fn list_orders(
        &self,
        filter: &OrderFilter,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Insert a new order in the created state.
    fn insert_order(
        &self,
        input: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Atomically check the order's current state and apply a transition.
    fn commit_transition(
        &self,
        commit: &TransitionCommit<'_>,
    ) -> impl Future<Output = Result<CommitOutcome, RepositoryError>> + Send;
}

/// Notification persistence.
pub trait NotificationStore: Send + Sync {
    /// Record a notification. Returns `None` if the recipient does not exist.
    fn insert_notification(
        &self,
        input: &NewNotification,
    ) -> impl Future<Output = Result<Option<Notification>, RepositoryError>> + Send;

    /// The recipient's most recent notifications, newest first.
    fn list_notifications(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Notification>, RepositoryError>> + Send;

    /// Number of unread notifications for the recipient.
    fn unread_count(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    /// Mark one notification read. Returns `false` if it does not exist or
    /// belongs to someone else.
    fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Mark all of the recipient's notifications read. Returns rows changed.
    fn mark_all_read(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Direct message persistence.
pub trait MessageStore: Send + Sync {
    /// Store a message. Returns `None` if the receiver does not exist.
    fn insert_message(
        &self,
        input: &NewMessage,
    ) -> impl Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Messages `user_id` sent or received. With `with` set, only that
    /// conversation, oldest first; otherwise all of them, newest first.
    fn list_messages(
        &self,
        user_id: UserId,
        with: Option<UserId>,
    ) -> impl Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Mark a message read. Returns `false` if it does not exist or
    /// `user_id` is not its receiver.
    fn mark_message_read(
        &self,
        id: MessageId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// A complete storage backend.
pub trait Store:
    ProductStore + UserStore + OrderStore + NotificationStore + MessageStore + Clone + 'static
{
    /// Check that the backend is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
