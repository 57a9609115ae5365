//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an account awaiting approval
//! sh-cli user create -e buyer@example.com -n "Buyer Org"
//!
//! # Create a staff account that can sign in immediately
//! sh-cli user create -e ops@example.com -n "Ops" -r admin --approved
//!
//! # Approve an account
//! sh-cli user approve 3
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use tracing::info;

use supplyhub_core::{Email, Role, UserId};
use supplyhub_server::db::{PgStore, RepositoryError, UserStore};
use supplyhub_server::models::NewUser;
use supplyhub_server::services::{AccountService, LifecycleError};

use super::{CommandError, connect};

/// Create a new account.
///
/// # Errors
///
/// Returns an error if the email or role is invalid, the email is taken, or
/// the database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    approved: bool,
) -> Result<UserId, CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
    let role: Role = role.parse().map_err(|_| {
        CommandError::InvalidArgument(format!(
            "Invalid role: {role}. Valid roles: user, admin, super_admin"
        ))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::InvalidArgument(
            "name must not be empty".to_string(),
        ));
    }

    let store = PgStore::new(connect().await?);
    let user = store
        .create_user(&NewUser {
            email,
            name: name.to_string(),
            role,
            is_approved: approved,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                CommandError::InvalidArgument("an account with this email already exists".into())
            }
            other => other.into(),
        })?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, approved, "Account created");
    Ok(user.id)
}

/// Approve an account and notify its owner.
///
/// Approving an already approved account changes nothing.
///
/// # Errors
///
/// Returns an error if the account does not exist or the database is
/// unreachable.
pub async fn approve(id: i32) -> Result<(), CommandError> {
    let user_id = UserId::new(id);
    let store = PgStore::new(connect().await?);

    let approval = AccountService::new(store)
        .approve(user_id)
        .await
        .map_err(|e| match e {
            LifecycleError::NotFound(what) => {
                CommandError::InvalidArgument(format!("{what} not found"))
            }
            other => other.into(),
        })?;

    if approval.newly_approved {
        info!(%user_id, email = %approval.user.email, "Account approved");
    } else {
        info!(%user_id, "Account was already approved");
    }
    Ok(())
}
