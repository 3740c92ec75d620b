//! Axum routes for earnings and wallet endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::http::state::AppState;

use super::handlers::{
    earnings_summary, earnings_transactions, get_wallet, top_up, wallet_transactions,
};

/// Routes mounted at `/api/earnings`.
pub fn earnings_routes() -> Router<AppState> {
    Router::new()
        .route("/summary", get(earnings_summary))
        .route("/transactions", get(earnings_transactions))
}

/// Routes mounted at `/api/wallet`.
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wallet))
        .route("/transactions", get(wallet_transactions))
        .route("/topup", post(top_up))
}
