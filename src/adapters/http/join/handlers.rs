//! HTTP handlers for invite, join and direct purchase endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::{AdminUser, AuthenticatedUser};
use crate::adapters::http::state::AppState;
use crate::application::handlers::{
    ConfirmDevJoinCommand, ExpireJoinIntentCommand, InitiateDirectPurchaseCommand, InitiateJoinCommand, IssueInviteCommand,
    ResolveInviteQuery,
};
use crate::domain::foundation::{GroupId, JoinIntentId};
use crate::domain::join::JoinError;

use super::dto::{
    ConfirmJoinRequest, ConfirmJoinResponse, InvitePreviewResponse, InviteResponse,
    IssueInviteRequest, JoinIntentResponse, JoinRequest, JoinResponse, PurchaseResponse,
};

fn parse_group_id(raw: &str) -> Result<GroupId, ApiError> {
    raw.parse::<GroupId>().map_err(|_| {
        JoinError::validation("group_id", format!("'{}' is not a group id", raw)).into()
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Invites
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/invites/:code - Preview the group behind an invite
pub async fn resolve_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .resolve_invite_handler()
        .handle(ResolveInviteQuery { code })
        .await?;

    Ok(Json(InvitePreviewResponse::from(result)))
}

/// POST /api/groups/:id/invites - Issue a new invite link
pub async fn issue_invite(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(group_id): Path<String>,
    Json(request): Json<IssueInviteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = IssueInviteCommand {
        group_id: parse_group_id(&group_id)?,
        user_id: user.user_id,
        max_uses: request.max_uses,
        expires_in_minutes: request.expires_in_minutes,
    };

    let result = state.issue_invite_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::from(result.invite))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Joining
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/invites/:code/join - Start joining through an invite
pub async fn initiate_join(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(code): Path<String>,
    Json(request): Json<JoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = InitiateJoinCommand {
        code,
        user_id: user.user_id,
        payment_method: request.payment_method,
    };

    let result = state.initiate_join_handler().handle(cmd).await?;

    Ok(Json(JoinResponse::from(result)))
}

/// POST /api/invites/:code/join/confirm - Confirm a dev-mode join
///
/// Answers 404 wherever dev payments are disabled.
pub async fn confirm_join(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(_code): Path<String>,
    Json(request): Json<ConfirmJoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ConfirmDevJoinCommand {
        intent_id: request.join_intent_id,
        user_id: user.user_id,
    };

    let result = state.confirm_dev_join_handler().handle(cmd).await?;

    Ok(Json(ConfirmJoinResponse::from(result)))
}

/// POST /api/invites/:code/join/cancel - Abandon the caller's pending intent
pub async fn cancel_join(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(_code): Path<String>,
    Json(request): Json<ConfirmJoinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ExpireJoinIntentCommand {
        intent_id: request.join_intent_id,
        requested_by: Some(user.user_id),
    };

    let result = state.expire_join_intent_handler().handle(cmd).await?;

    Ok(Json(JoinIntentResponse::from(result.intent)))
}

/// POST /api/admin/join-intents/:id/expire - Expire a stale intent
pub async fn expire_intent(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let intent_id = id.parse::<JoinIntentId>().map_err(|_| -> ApiError {
        JoinError::validation("join_intent_id", format!("'{}' is not a join intent id", id)).into()
    })?;
    tracing::info!(admin_id = %admin.user_id, intent_id = %intent_id, "Join intent expiry requested");

    let result = state
        .expire_join_intent_handler()
        .handle(ExpireJoinIntentCommand {
            intent_id,
            requested_by: None,
        })
        .await?;

    Ok(Json(JoinIntentResponse::from(result.intent)))
}

/// POST /api/groups/:id/purchase - Buy a seat without an invite
pub async fn purchase_seat(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(group_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = InitiateDirectPurchaseCommand {
        group_id: parse_group_id(&group_id)?,
        buyer_id: user.user_id,
    };

    let result = state.direct_purchase_handler().handle(cmd).await?;
    let currency = state.settings.current().await?.currency;

    Ok(Json(PurchaseResponse::new(result, currency)))
}
