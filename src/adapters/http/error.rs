//! Conversion of application errors into HTTP responses.
//!
//! Every feature error carries an `ErrorCode`; the status is chosen from the
//! code so the same condition answers the same way on every route.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::invite::InviteError;
use crate::domain::join::JoinError;
use crate::domain::ledger::WalletError;
use crate::domain::withdrawal::WithdrawalError;

use super::dto::ErrorResponse;

/// Maps an error code to its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed
        | ErrorCode::EmptyField
        | ErrorCode::OutOfRange
        | ErrorCode::InvalidFormat
        | ErrorCode::MissingCode
        | ErrorCode::BalanceLimitExceeded
        | ErrorCode::FeatureDisabled
        | ErrorCode::InvalidSignature => StatusCode::BAD_REQUEST,

        ErrorCode::NotFound
        | ErrorCode::GroupNotFound
        | ErrorCode::InviteNotFound
        | ErrorCode::JoinIntentNotFound
        | ErrorCode::TransactionNotFound
        | ErrorCode::WithdrawalNotFound => StatusCode::NOT_FOUND,

        ErrorCode::InviteDisabled | ErrorCode::InviteExpired | ErrorCode::InviteMaxUses => {
            StatusCode::GONE
        }

        ErrorCode::AlreadyMember
        | ErrorCode::GroupFull
        | ErrorCode::GroupArchived
        | ErrorCode::DuplicateRequest
        | ErrorCode::InvalidStateTransition
        | ErrorCode::Conflict => StatusCode::CONFLICT,

        ErrorCode::InsufficientFunds | ErrorCode::PaymentRequired => StatusCode::PAYMENT_REQUIRED,

        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,

        ErrorCode::ExternalServiceError => StatusCode::BAD_GATEWAY,

        ErrorCode::NoOwner
        | ErrorCode::IntegrityViolation
        | ErrorCode::DatabaseError
        | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// API error returned by every handler in this adapter.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: status_for(code),
            code,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        // Dev confirmation does not exist where dev payments are off.
        if matches!(err, JoinError::DevPaymentsDisabled) {
            return ApiError::new(err.code(), err.message()).with_status(StatusCode::NOT_FOUND);
        }
        ApiError::new(err.code(), err.message())
    }
}

impl From<InviteError> for ApiError {
    fn from(err: InviteError) -> Self {
        ApiError::new(err.code(), err.message())
    }
}

impl From<WithdrawalError> for ApiError {
    fn from(err: WithdrawalError) -> Self {
        ApiError::new(err.code(), err.message())
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        ApiError::new(err.code(), err.message())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::new(err.code, err.message().to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.code.is_integrity_violation() {
            tracing::error!(
                alert = "reconciliation",
                code = %self.code,
                message = %self.message,
                "Request failed on an integrity violation"
            );
        } else if self.status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }

        // Internal details stay in the logs.
        let message = if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            "Something went wrong, please retry".to_string()
        } else {
            self.message
        };

        let body = ErrorResponse::new(self.code.to_string(), message);
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Money, WithdrawalId};

    #[test]
    fn invite_problems_are_gone() {
        assert_eq!(ApiError::from(InviteError::Expired).status(), StatusCode::GONE);
        assert_eq!(ApiError::from(InviteError::MaxUses).status(), StatusCode::GONE);
        assert_eq!(ApiError::from(InviteError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(InviteError::MissingCode).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn join_conflicts_are_409() {
        assert_eq!(ApiError::from(JoinError::AlreadyMember).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(JoinError::GroupFull).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn disabled_dev_payments_look_like_a_missing_route() {
        let err = ApiError::from(JoinError::DevPaymentsDisabled);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), ErrorCode::FeatureDisabled);
    }

    #[test]
    fn insufficient_funds_is_payment_required() {
        let err = ApiError::from(WalletError::InsufficientFunds {
            available: Money::from_minor(100),
            requested: Money::from_minor(400),
        });
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn withdrawal_errors_map_by_code() {
        assert_eq!(
            ApiError::from(WithdrawalError::NotFound(WithdrawalId::new())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(WithdrawalError::DuplicateRequest).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(WithdrawalError::Payout("bank down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn integrity_violations_are_server_errors() {
        let err = ApiError::from(JoinError::NoOwner {
            group_id: "g1".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn internal_messages_are_not_leaked() {
        let response = ApiError::from(DomainError::database("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert!(!body["message"].as_str().unwrap().contains("hunter2"));
    }
}
