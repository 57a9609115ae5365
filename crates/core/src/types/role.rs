//! Roles and the explicit caller identity passed into every operation.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Platform role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Purchasing organization: places orders and uploads payment proofs.
    User,
    /// Confirms orders, verifies payments, manages the catalog.
    Admin,
    /// Everything an admin can do plus account approval.
    SuperAdmin,
}

impl Role {
    /// Whether this role may act on other users' orders.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }

    /// The wire name (`USER`, `ADMIN`, `SUPER_ADMIN`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" | "SUPERADMIN" => Ok(Self::SuperAdmin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The authenticated caller of an operation.
///
/// Identity is established upstream; the lifecycle engine only ever sees an
/// `Actor` value and enforces role and ownership rules itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// The caller's user ID.
    pub id: UserId,
    /// The caller's role.
    pub role: Role,
}

impl Actor {
    /// Create a new actor.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether the actor holds an admin or super admin role.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Whether the actor is the given user.
    #[must_use]
    pub fn is(&self, user: UserId) -> bool {
        self.id == user
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_roles() {
        assert!(!Role::User.is_staff());
        assert!(Role::Admin.is_staff());
        assert!(Role::SuperAdmin.is_staff());
    }

    #[test]
    fn test_parse_accepts_common_spellings() {
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("super-admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("viewer".parse::<Role>().is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, format!("\"{}\"", Role::SuperAdmin));
    }
}
