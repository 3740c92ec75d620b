//! Axum routes for invite, join and purchase endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    cancel_join, confirm_join, expire_intent, initiate_join, issue_invite, purchase_seat,
    resolve_invite,
};

/// Routes mounted at `/api/invites`.
///
/// - `GET /:code` - Preview (no authentication)
/// - `POST /:code/join` - Start a join
/// - `POST /:code/join/confirm` - Confirm a dev-mode join
/// - `POST /:code/join/cancel` - Abandon a pending join
pub fn invite_routes() -> Router<AppState> {
    Router::new()
        .route("/:code", get(resolve_invite))
        .route("/:code/join", post(initiate_join))
        .route("/:code/join/confirm", post(confirm_join))
        .route("/:code/join/cancel", post(cancel_join))
}

/// Routes mounted at `/api/admin/join-intents`.
pub fn admin_join_routes() -> Router<AppState> {
    Router::new().route("/:id/expire", post(expire_intent))
}

/// Routes mounted at `/api/groups`.
///
/// - `POST /:id/invites` - Issue an invite
/// - `POST /:id/purchase` - Direct purchase
pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/invites", post(issue_invite))
        .route("/:id/purchase", post(purchase_seat))
}
