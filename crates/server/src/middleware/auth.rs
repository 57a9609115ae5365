//! Caller identity extractor.
//!
//! Authentication happens in front of this service. The identity layer
//! forwards the authenticated caller as two trusted headers, which handlers
//! receive as an [`Actor`] through [`RequireActor`].

use axum::{extract::FromRequestParts, http::request::Parts};

use supplyhub_core::{Actor, Role, UserId};

use crate::error::AppError;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extractor that requires an authenticated caller.
///
/// Rejects with 401 Unauthorized if either header is missing or malformed.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireActor(actor): RequireActor,
/// ) -> impl IntoResponse {
///     format!("Hello, user {}!", actor.id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireActor(pub Actor);

impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id: UserId = header(parts, USER_ID_HEADER)?
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;
        let role: Role = header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(|_| AppError::Unauthorized(format!("malformed {USER_ROLE_HEADER} header")))?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(id.to_string()),
                ..Default::default()
            }));
            scope.set_tag("role", role.as_str());
        });

        Ok(Self(Actor::new(id, role)))
    }
}

/// A required, non-empty header value.
fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {name} header")))
}
