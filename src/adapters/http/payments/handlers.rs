//! HTTP handlers for gateway callbacks and checkout verification.

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::AuthenticatedUser;
use crate::adapters::http::state::AppState;
use crate::application::handlers::{HandleGatewayWebhookCommand, VerifyPaymentCommand};
use crate::domain::webhook::{WebhookAck, WebhookError};

use super::dto::{VerifyPaymentRequest, VerifyPaymentResponse, WebhookRejection};

pub const SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

/// POST /api/payments/webhook - Gateway event delivery
///
/// The body is taken raw; the signature covers the exact bytes sent.
/// Only a bad signature answers non-2xx.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleGatewayWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match state.webhook_handler().handle(cmd).await {
        Ok(outcome) => Json(WebhookAck::from(&outcome)).into_response(),
        Err(err) => {
            let status = match &err {
                WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                    "invalid_signature"
                }
                WebhookError::ParseError(_) => "error",
            };
            let body = WebhookRejection {
                status,
                message: err.to_string(),
            };
            (err.status_code(), Json(body)).into_response()
        }
    }
}

/// POST /api/payments/verify - Confirm a checkout from the client
pub async fn verify_payment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = VerifyPaymentCommand {
        order_id: request.order_id,
        payment_id: request.payment_id,
        signature: request.signature,
    };

    let result = state.verify_payment_handler().handle(cmd).await?;

    Ok(Json(VerifyPaymentResponse::from(result)))
}
