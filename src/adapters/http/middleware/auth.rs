//! Caller identity extractors.
//!
//! Authentication happens in front of this service. The edge proxy forwards
//! the verified caller as headers:
//!
//! ```text
//! X-User-Id: 5f0c...            (required on user routes)
//! X-User-Role: admin            (required on /api/admin routes)
//! ```
//!
//! Handlers take `AuthenticatedUser` or `AdminUser` as an argument; a missing
//! or malformed header rejects the request before the handler runs.

use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::dto::ErrorResponse;
use crate::domain::foundation::UserId;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

const ADMIN_ROLES: [&str; 2] = ["admin", "super_admin"];

/// The calling user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// A caller holding an operator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminUser {
    pub user_id: UserId,
}

/// Rejection type for identity extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No usable user id header.
    Unauthenticated,
    /// Authenticated, but not an operator.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication is required",
            ),
            AuthRejection::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "This action requires an admin role",
            ),
        };
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

fn user_from_parts(parts: &Parts) -> Result<UserId, AuthRejection> {
    parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<UserId>().ok())
        .ok_or(AuthRejection::Unauthenticated)
}

fn is_admin(parts: &Parts) -> bool {
    parts
        .headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|role| {
            let role = role.trim().to_ascii_lowercase();
            ADMIN_ROLES.contains(&role.as_str())
        })
        .unwrap_or(false)
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = user_from_parts(parts)?;
        Ok(AuthenticatedUser { user_id })
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = user_from_parts(parts)?;
        if !is_admin(parts) {
            tracing::warn!(user_id = %user_id, "Admin route called without admin role");
            return Err(AuthRejection::Forbidden);
        }
        Ok(AdminUser { user_id })
    }
}
