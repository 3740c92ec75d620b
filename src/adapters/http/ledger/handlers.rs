//! HTTP handlers for earnings and wallet endpoints.

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::dto::{PageQuery, PageResponse, TransactionResponse};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::AuthenticatedUser;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    GetEarningsSummaryQuery, GetWalletQuery, ListEarningsTransactionsQuery,
    ListWalletTransactionsQuery, TopUpWalletCommand,
};
use crate::ports::PageRequest;

use super::dto::{
    EarningsSummaryResponse, TopUpRequest, TopUpResponse, WalletResponse,
    WalletTransactionResponse, WalletTransactionsQuery,
};

// ════════════════════════════════════════════════════════════════════════════════
// Earnings
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/earnings/summary - Balances, matured first
pub async fn earnings_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetEarningsSummaryQuery {
        owner_id: user.user_id,
        as_of: None,
    };

    let summary = state.earnings_summary_handler().handle(query).await?;

    Ok(Json(EarningsSummaryResponse::from(summary)))
}

/// GET /api/earnings/transactions - Paid seat sales, newest first
pub async fn earnings_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(paging): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = paging.to_request();
    let query = ListEarningsTransactionsQuery {
        owner_id: user.user_id,
        page,
    };

    let result = state.earnings_transactions_handler().handle(query).await?;

    Ok(Json(PageResponse::<TransactionResponse>::from_page(result, page)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Wallet
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/wallet - Current balance
pub async fn get_wallet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .get_wallet_handler()
        .handle(GetWalletQuery {
            user_id: user.user_id,
        })
        .await?;

    Ok(Json(WalletResponse::from(result)))
}

/// GET /api/wallet/transactions - Filtered wallet history
pub async fn wallet_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<WalletTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = params.to_filter();
    let page = PageRequest::new(filter.page, filter.limit);
    let query = ListWalletTransactionsQuery {
        user_id: user.user_id,
        filter,
    };

    let result = state.wallet_transactions_handler().handle(query).await?;

    Ok(Json(PageResponse::<WalletTransactionResponse>::from_page(result, page)))
}

/// POST /api/wallet/topup - Credit the wallet
///
/// A replayed idempotency key answers 200 with the original entry.
pub async fn top_up(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<TopUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = TopUpWalletCommand {
        user_id: user.user_id,
        amount: request.amount,
        idempotency_key: request.idempotency_key,
    };

    let result = state.top_up_handler().handle(cmd).await?;

    let status = if result.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(TopUpResponse::from(result))))
}
