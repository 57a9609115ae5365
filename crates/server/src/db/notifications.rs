//! Notification repository for the per-recipient inbox.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use supplyhub_core::{NotificationId, NotificationKind, OrderId, UserId};

use super::RepositoryError;
use crate::models::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, order_id, kind, title, message, is_read, created_at";

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i32,
    user_id: i32,
    order_id: Option<i32>,
    kind: NotificationKind,
    title: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            user_id: UserId::new(row.user_id),
            order_id: row.order_id.map(OrderId::new),
            kind: row.kind,
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// Repository for notification database operations.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a notification.
    ///
    /// Inserts nothing and returns `None` when the recipient does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        input: &NewNotification,
    ) -> Result<Option<Notification>, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r"
            INSERT INTO notifications (user_id, order_id, kind, title, message)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $1)
            RETURNING {NOTIFICATION_COLUMNS}
            "
        ))
        .bind(input.user_id)
        .bind(input.order_id)
        .bind(input.kind)
        .bind(&input.title)
        .bind(&input.message)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// The recipient's most recent notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one of the recipient's notifications read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread notification of the recipient read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
