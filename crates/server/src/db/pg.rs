//! `PostgreSQL` store backend.

use sqlx::PgPool;

use supplyhub_core::{MessageId, NotificationId, OrderId, ProductId, Role, UserId};

use super::{
    CommitOutcome, MessageRepository, MessageStore, NotificationRepository, NotificationStore, OrderRepository, OrderStore,
    ProductRepository, ProductStore, RepositoryError, Store, TransitionCommit, UserRepository,
    UserStore,
};
use crate::models::{
    Message, NewMessage, NewNotification, NewOrder, NewProduct, NewUser, Notification, Order,
    OrderFilter, Product, ProductFilter, ProductUpdate, User,
};

/// Store backed by a `PostgreSQL` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ProductStore for PgStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        ProductRepository::new(&self.pool).list(filter).await
    }

    async fn create_product(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool).create(input).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).update(id, input).await
    }
}

impl UserStore for PgStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn create_user(&self, input: &NewUser) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(input).await
    }

    async fn list_users(&self, roles: Option<&[Role]>) -> Result<Vec<User>, RepositoryError> {
        UserRepository::new(&self.pool).list(roles).await
    }

    async fn staff_ids(&self, except: UserId) -> Result<Vec<UserId>, RepositoryError> {
        UserRepository::new(&self.pool).staff_ids(except).await
    }

    async fn approve_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).approve(id).await
    }
}

impl OrderStore for PgStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).list(filter).await
    }

    async fn insert_order(&self, input: &NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).create(input).await
    }

    async fn commit_transition(
        &self,
        commit: &TransitionCommit<'_>,
    ) -> Result<CommitOutcome, RepositoryError> {
        OrderRepository::new(&self.pool)
            .commit_transition(commit)
            .await
    }
}

impl NotificationStore for PgStore {
    async fn insert_notification(
        &self,
        input: &NewNotification,
    ) -> Result<Option<Notification>, RepositoryError> {
        NotificationRepository::new(&self.pool).create(input).await
    }

    async fn list_notifications(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        NotificationRepository::new(&self.pool)
            .list_for_user(user_id, limit)
            .await
    }

    async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        NotificationRepository::new(&self.pool)
            .unread_count(user_id)
            .await
    }

    async fn mark_read(&self, id: NotificationId, user_id: UserId) -> Result<bool, RepositoryError> {
        NotificationRepository::new(&self.pool)
            .mark_read(id, user_id)
            .await
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        NotificationRepository::new(&self.pool)
            .mark_all_read(user_id)
            .await
    }
}

impl MessageStore for PgStore {
    async fn insert_message(&self, input: &NewMessage) -> Result<Option<Message>, RepositoryError> {
        MessageRepository::new(&self.pool).create(input).await
    }

    async fn list_messages(
        &self,
        user_id: UserId,
        with: Option<UserId>,
    ) -> Result<Vec<Message>, RepositoryError> {
        MessageRepository::new(&self.pool).list(user_id, with).await
    }

    async fn mark_message_read(
        &self,
        id: MessageId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        MessageRepository::new(&self.pool)
            .mark_read(id, user_id)
            .await
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
