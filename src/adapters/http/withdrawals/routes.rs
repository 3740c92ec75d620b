//! Axum routes for withdrawal endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    approve_withdrawal, create_withdrawal, list_withdrawals, my_withdrawals, reject_withdrawal,
    settle_withdrawal,
};

/// Routes mounted at `/api/withdrawals`.
pub fn withdrawal_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_withdrawal))
        .route("/mine", get(my_withdrawals))
}

/// Routes mounted at `/api/admin/withdrawals`; every handler takes `AdminUser`.
pub fn admin_withdrawal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_withdrawals))
        .route("/:id/approve", post(approve_withdrawal))
        .route("/:id/reject", post(reject_withdrawal))
        .route("/:id/settle", post(settle_withdrawal))
}
