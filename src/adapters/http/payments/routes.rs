//! Axum routes for payment endpoints.

use axum::{routing::post, Router};

use crate::adapters::http::state::AppState;

use super::handlers::{handle_webhook, verify_payment};

/// Routes mounted at `/api/payments`.
///
/// - `POST /webhook` - Gateway events (no user authentication, signature verified)
/// - `POST /verify` - Client checkout confirmation
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .route("/verify", post(verify_payment))
}
