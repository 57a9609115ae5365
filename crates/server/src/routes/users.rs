//! Account handlers.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use supplyhub_core::{Role, UserId};

use crate::{
    db::Store, error::AppError, middleware::RequireActor, models::User, state::AppState,
};

/// Build the users router.
pub fn router<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/users", get(list_users::<S>))
        .route("/api/users/{id}/approve", post(approve_user::<S>))
}

/// Query parameters for the account directory.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    /// Comma-separated roles, e.g. `ADMIN,SUPER_ADMIN`.
    #[serde(default)]
    pub role: Option<String>,
}

impl ListUsersQuery {
    fn roles(&self) -> Result<Option<Vec<Role>>, AppError> {
        let Some(raw) = self.role.as_deref() else {
            return Ok(None);
        };
        let roles = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<Role>()
                    .map_err(|_| AppError::BadRequest(format!("unknown role: {s}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if roles.is_empty() {
            return Err(AppError::BadRequest("role filter is empty".to_string()));
        }
        Ok(Some(roles))
    }
}

/// Response with a single account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Response with a list of accounts.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// List accounts, newest first.
///
/// # Errors
///
/// Returns 400 for an unknown role and 403 if a caller other than a super
/// admin omits the role filter.
pub async fn list_users<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    query: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<Json<UsersResponse>, AppError> {
    let Query(query) = query?;
    let roles = query.roles()?;
    let users = state.accounts().directory(actor, roles.as_deref()).await?;
    Ok(Json(UsersResponse { users }))
}

/// Approve a registered account.
///
/// # Errors
///
/// Returns 403 unless the caller is a super admin and 404 if the account
/// does not exist.
pub async fn approve_user<S: Store>(
    RequireActor(actor): RequireActor,
    State(state): State<AppState<S>>,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Path(id) = path?;
    let user = state.accounts().approve_account(actor, id).await?;
    Ok(Json(UserResponse { user }))
}
