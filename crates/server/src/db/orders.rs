//! Order repository: order queries and atomic lifecycle transitions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use supplyhub_core::{DeliveryStatus, OrderId, OrderStatus, Price, ProductId, UserId};

use super::{CommitOutcome, RepositoryError, TransitionCommit};
use crate::models::{NewOrder, Order, OrderFilter};

const ORDER_COLUMNS: &str = "id, user_id, product_id, quantity, total_price, status, \
     delivery_status, payment_proof, payment_verified, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: i32,
    total_price: Price,
    status: OrderStatus,
    delivery_status: DeliveryStatus,
    payment_proof: Option<String>,
    payment_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order = Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: ProductId::new(row.product_id),
            quantity: row.quantity,
            total_price: row.total_price,
            status: row.status,
            delivery_status: row.delivery_status,
            payment_proof: row.payment_proof,
            payment_verified: row.payment_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };

        if !order.state().is_consistent() {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} has inconsistent state {}",
                order.id,
                order.state()
            )));
        }

        Ok(order)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored state is inconsistent.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::INTEGER IS NULL OR user_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(filter.user_id)
        .bind(filter.status)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a new order in the `PENDING` / `NOT_SHIPPED` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or product no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, product_id, quantity, total_price)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(input.user_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.total_price)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        row.try_into()
    }

    /// Apply a lifecycle transition in a single transaction.
    ///
    /// The `UPDATE` only matches while the row still holds `commit.expected`
    /// and `commit.expected_proof`, so of two concurrent callers validated against the same state exactly
    /// one sees `Applied`; the other blocks on the row lock, re-evaluates the
    /// predicate and gets `Conflict`. A stock decrement runs inside the same
    /// transaction and only succeeds while enough units remain, so stock is
    /// never driven negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn commit_transition(
        &self,
        commit: &TransitionCommit<'_>,
    ) -> Result<CommitOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders
            SET status = $2,
                delivery_status = $3,
                payment_verified = $4,
                payment_proof = COALESCE($5, payment_proof),
                updated_at = NOW()
            WHERE id = $1
              AND status = $6
              AND delivery_status = $7
              AND payment_verified = $8
              AND payment_proof IS NOT DISTINCT FROM $9
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(commit.order_id)
        .bind(commit.next.status)
        .bind(commit.next.delivery_status)
        .bind(commit.next.payment_verified)
        .bind(commit.payment_proof)
        .bind(commit.expected.status)
        .bind(commit.expected.delivery_status)
        .bind(commit.expected.payment_verified)
        .bind(commit.expected_proof)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(CommitOutcome::Conflict);
        };

        if let Some(decrement) = commit.stock_decrement {
            let remaining: Option<i32> = sqlx::query_scalar(
                r"
                UPDATE products
                SET quantity = quantity - $2, updated_at = NOW()
                WHERE id = $1 AND quantity >= $2
                RETURNING quantity
                ",
            )
            .bind(decrement.product_id)
            .bind(decrement.quantity)
            .fetch_optional(&mut *tx)
            .await?;

            if remaining.is_none() {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
                        .bind(decrement.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                tx.rollback().await?;
                return Ok(CommitOutcome::InsufficientStock {
                    available: available.unwrap_or(0),
                });
            }
        }

        tx.commit().await?;
        Ok(CommitOutcome::Applied(row.try_into()?))
    }
}
