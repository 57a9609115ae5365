//! Message repository for direct messages between accounts.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use supplyhub_core::{MessageId, Role, UserId};

use super::RepositoryError;
use crate::models::{Message, NewMessage, Participant};

/// Message columns joined with both participants' names and roles.
const MESSAGE_SELECT: &str = r"
    SELECT m.id, m.sender_id, s.name AS sender_name, s.role AS sender_role,
           m.receiver_id, r.name AS receiver_name, r.role AS receiver_role,
           m.message, m.is_read, m.created_at
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    JOIN users r ON r.id = m.receiver_id
";

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    sender_id: i32,
    sender_name: String,
    sender_role: Role,
    receiver_id: i32,
    receiver_name: String,
    receiver_role: Role,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: MessageId::new(row.id),
            sender: Participant {
                id: UserId::new(row.sender_id),
                name: row.sender_name,
                role: row.sender_role,
            },
            receiver: Participant {
                id: UserId::new(row.receiver_id),
                name: row.receiver_name,
                role: row.receiver_role,
            },
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

/// Repository for message database operations.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a message.
    ///
    /// Inserts nothing and returns `None` when the receiver does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &NewMessage) -> Result<Option<Message>, RepositoryError> {
        let id: Option<i32> = sqlx::query_scalar(
            r"
            INSERT INTO messages (sender_id, receiver_id, message)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $2)
            RETURNING id
            ",
        )
        .bind(input.sender_id)
        .bind(input.receiver_id)
        .bind(&input.message)
        .fetch_optional(self.pool)
        .await?;

        let Some(id) = id else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, MessageRow>(&format!("{MESSAGE_SELECT} WHERE m.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Messages `user_id` sent or received.
    ///
    /// With `with` set, only the conversation between the two accounts,
    /// oldest first. Otherwise everything, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        user_id: UserId,
        with: Option<UserId>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = match with {
            Some(other) => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    r"{MESSAGE_SELECT}
                    WHERE (m.sender_id = $1 AND m.receiver_id = $2)
                       OR (m.sender_id = $2 AND m.receiver_id = $1)
                    ORDER BY m.created_at ASC, m.id ASC
                    "
                ))
                .bind(user_id)
                .bind(other)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MessageRow>(&format!(
                    r"{MESSAGE_SELECT}
                    WHERE m.sender_id = $1 OR m.receiver_id = $1
                    ORDER BY m.created_at DESC, m.id DESC
                    "
                ))
                .bind(user_id)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Mark a message read.
    ///
    /// Returns `false` if it does not exist or `user_id` is not its receiver.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(&self, id: MessageId, user_id: UserId) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1 AND receiver_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
