//! Top-level API router.
//!
//! Mounts every feature router under `/api` and wraps the whole tree in
//! request tracing, request ids, CORS and an optional request timeout.

use std::time::Duration;

use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::join::{admin_join_routes, group_routes, invite_routes};
use super::ledger::{earnings_routes, wallet_routes};
use super::payments::payment_routes;
use super::state::AppState;
use super::withdrawals::{admin_withdrawal_routes, withdrawal_routes};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Unlayered route tree, still waiting for its state.
///
/// # Routes
/// - `/api/invites` - Invite preview and joins
/// - `/api/groups` - Invite issuing and direct purchase
/// - `/api/payments` - Gateway webhook and checkout verification
/// - `/api/earnings` - Owner earnings
/// - `/api/wallet` - User wallet
/// - `/api/withdrawals` - Owner withdrawal requests
/// - `/api/admin/withdrawals` - Operator withdrawal review
/// - `/api/admin/join-intents` - Operator intent housekeeping
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest("/api/invites", invite_routes())
        .nest("/api/groups", group_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/earnings", earnings_routes())
        .nest("/api/wallet", wallet_routes())
        .nest("/api/withdrawals", withdrawal_routes())
        .nest("/api/admin/withdrawals", admin_withdrawal_routes())
        .nest("/api/admin/join-intents", admin_join_routes())
}

/// The full application: routes, state and middleware.
pub fn api_router(state: AppState, cors: CorsLayer, request_timeout: Option<Duration>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let router = api_routes().with_state(state);
    let router = match request_timeout {
        Some(timeout) => router.layer(TimeoutLayer::new(timeout)),
        None => router,
    };

    router
        .layer(cors)
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}
