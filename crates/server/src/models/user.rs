//! Platform account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplyhub_core::{Email, Role, UserId};

/// A platform account (purchasing organization or staff member).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Permission level.
    pub role: Role,
    /// Whether a super admin approved the registration.
    pub is_approved: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub is_approved: bool,
}
