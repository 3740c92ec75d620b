//! HTTP handlers for owner and operator withdrawal endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{AdminUser, AuthenticatedUser};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    ApproveWithdrawalCommand, ListWithdrawalsQuery, PayoutOutcome, RejectWithdrawalCommand,
    RequestWithdrawalCommand, SettleWithdrawalCommand,
};
use crate::domain::foundation::{ErrorCode, WithdrawalId};

use super::dto::{
    AdminWithdrawalsQuery, ApproveWithdrawalResponse, CreateWithdrawalRequest,
    RejectWithdrawalRequest, SettleWithdrawalRequest, WithdrawalResponse,
};

fn parse_withdrawal_id(raw: &str) -> Result<WithdrawalId, ApiError> {
    raw.parse::<WithdrawalId>().map_err(|_| {
        ApiError::new(
            ErrorCode::InvalidFormat,
            format!("'{}' is not a withdrawal id", raw),
        )
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Owner endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/withdrawals - Request a withdrawal
pub async fn create_withdrawal(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateWithdrawalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = RequestWithdrawalCommand {
        owner_id: user.user_id,
        source: request.source,
        amount: request.amount,
        payout_method: request.payout_method,
        payout_details: request.payout_details,
    };

    let result = state.request_withdrawal_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(WithdrawalResponse::from(result.request))))
}

/// GET /api/withdrawals/mine - The caller's withdrawal requests
pub async fn my_withdrawals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .list_withdrawals_handler()
        .handle(ListWithdrawalsQuery::Mine {
            owner_id: user.user_id,
        })
        .await?;

    let response: Vec<WithdrawalResponse> =
        requests.into_iter().map(WithdrawalResponse::from).collect();
    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Operator endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/admin/withdrawals - All requests, filtered by status and source
pub async fn list_withdrawals(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<AdminWithdrawalsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requests = state
        .list_withdrawals_handler()
        .handle(ListWithdrawalsQuery::All {
            status: params.status,
            source: params.source,
        })
        .await?;

    let response: Vec<WithdrawalResponse> =
        requests.into_iter().map(WithdrawalResponse::from).collect();
    Ok(Json(response))
}

/// POST /api/admin/withdrawals/:id/approve - Approve and send the payout
///
/// 200 when the payout completed, 202 when it is still in flight or its
/// outcome is unknown.
pub async fn approve_withdrawal(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal_id = parse_withdrawal_id(&id)?;
    tracing::info!(admin_id = %admin.user_id, withdrawal_id = %withdrawal_id, "Withdrawal approval requested");

    let result = state
        .approve_withdrawal_handler()
        .handle(ApproveWithdrawalCommand { withdrawal_id })
        .await?;

    let status = match result.outcome {
        PayoutOutcome::Paid => StatusCode::OK,
        PayoutOutcome::InFlight | PayoutOutcome::Unknown => StatusCode::ACCEPTED,
    };
    Ok((status, Json(ApproveWithdrawalResponse::from(result))))
}

/// POST /api/admin/withdrawals/:id/reject - Reject and refund
pub async fn reject_withdrawal(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    request: Option<Json<RejectWithdrawalRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal_id = parse_withdrawal_id(&id)?;
    let reason = request.and_then(|Json(r)| r.reason);
    tracing::info!(admin_id = %admin.user_id, withdrawal_id = %withdrawal_id, "Withdrawal rejection requested");

    let result = state
        .reject_withdrawal_handler()
        .handle(RejectWithdrawalCommand {
            withdrawal_id,
            reason,
        })
        .await?;

    Ok(Json(WithdrawalResponse::from(result.request)))
}

/// POST /api/admin/withdrawals/:id/settle - Confirm an in-flight payout as paid
pub async fn settle_withdrawal(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    request: Option<Json<SettleWithdrawalRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal_id = parse_withdrawal_id(&id)?;
    let request = request.map(|Json(r)| r).unwrap_or_default();
    tracing::info!(admin_id = %admin.user_id, withdrawal_id = %withdrawal_id, "Withdrawal settlement requested");

    let result = state
        .settle_withdrawal_handler()
        .handle(SettleWithdrawalCommand {
            withdrawal_id,
            utr: request.utr,
            payout_id: request.payout_id,
        })
        .await?;

    Ok(Json(WithdrawalResponse::from(result.request)))
}
