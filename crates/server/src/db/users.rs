//! User repository for account queries.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use supplyhub_core::{Email, Role, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewUser, User};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    role: Role,
    is_approved: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            is_approved: row.is_approved,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, role, is_approved, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (email, name, role, is_approved)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role, is_approved, created_at
            ",
        )
        .bind(&input.email)
        .bind(&input.name)
        .bind(input.role)
        .bind(input.is_approved)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "email already exists"))?;

        row.try_into()
    }

    /// Accounts newest first, optionally restricted to `roles`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self, roles: Option<&[Role]>) -> Result<Vec<User>, RepositoryError> {
        let roles: Option<Vec<&str>> = roles.map(|r| r.iter().map(|role| role.as_str()).collect());

        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, name, role, is_approved, created_at
            FROM users
            WHERE $1::TEXT[] IS NULL OR role::TEXT = ANY($1)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(roles)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// IDs of every admin and super admin other than `except`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn staff_ids(&self, except: UserId) -> Result<Vec<UserId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, UserId>(
            r"
            SELECT id
            FROM users
            WHERE role IN ('ADMIN', 'SUPER_ADMIN') AND id <> $1
            ORDER BY id
            ",
        )
        .bind(except)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Mark an account approved.
    ///
    /// Returns the user with `is_approved` as it was *before* the update, so
    /// callers can tell a fresh approval from a repeated one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn approve(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users AS u
            SET is_approved = TRUE
            FROM (SELECT id, is_approved FROM users WHERE id = $1 FOR UPDATE) AS before
            WHERE u.id = before.id
            RETURNING u.id, u.email, u.name, u.role, before.is_approved, u.created_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
