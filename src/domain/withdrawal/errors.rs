//! Withdrawal-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | Disabled | 403 |
//! | BelowMinimum | 400 |
//! | InvalidPayoutDetails | 400 |
//! | InsufficientFunds | 409 |
//! | DuplicateRequest | 409 |
//! | InvalidState | 409 |
//! | Conflict | 409 |
//! | Payout | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, Money, WithdrawalId};
use crate::domain::ledger::money_detail;

use super::WithdrawalSource;

/// Withdrawal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WithdrawalError {
    NotFound(WithdrawalId),

    /// Withdrawals from this source are switched off.
    Disabled(WithdrawalSource),

    BelowMinimum { minimum: Money, requested: Money },

    InvalidPayoutDetails { field: String, message: String },

    InsufficientFunds { available: Money, requested: Money },

    /// Another request for the same source is still open.
    DuplicateRequest,

    InvalidState { current: String, attempted: String },

    /// A concurrent update moved the request first.
    Conflict(String),

    /// The payout provider definitively failed the transfer.
    Payout(String),

    Infrastructure(String),
}

impl WithdrawalError {
    pub fn payout_details(field: impl Into<String>, message: impl Into<String>) -> Self {
        WithdrawalError::InvalidPayoutDetails {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        WithdrawalError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            WithdrawalError::NotFound(_) => ErrorCode::WithdrawalNotFound,
            WithdrawalError::Disabled(_) => ErrorCode::FeatureDisabled,
            WithdrawalError::BelowMinimum { .. } => ErrorCode::OutOfRange,
            WithdrawalError::InvalidPayoutDetails { .. } => ErrorCode::ValidationFailed,
            WithdrawalError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            WithdrawalError::DuplicateRequest => ErrorCode::DuplicateRequest,
            WithdrawalError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            WithdrawalError::Conflict(_) => ErrorCode::Conflict,
            WithdrawalError::Payout(_) => ErrorCode::ExternalServiceError,
            WithdrawalError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            WithdrawalError::NotFound(id) => format!("Withdrawal request not found: {}", id),
            WithdrawalError::Disabled(source) => {
                format!("Withdrawals from {} are currently disabled", source)
            }
            WithdrawalError::BelowMinimum { minimum, requested } => format!(
                "Minimum withdrawal is {}, requested {}",
                minimum, requested
            ),
            WithdrawalError::InvalidPayoutDetails { message, .. } => message.clone(),
            WithdrawalError::InsufficientFunds {
                available,
                requested,
            } => format!(
                "Insufficient withdrawable balance: {} available, {} requested",
                available, requested
            ),
            WithdrawalError::DuplicateRequest => {
                "You already have a pending withdrawal request".to_string()
            }
            WithdrawalError::InvalidState { current, attempted } => {
                format!("Cannot {} withdrawal, status is {}", attempted, current)
            }
            WithdrawalError::Conflict(msg) => format!("Concurrent update: {}", msg),
            WithdrawalError::Payout(msg) => format!("Payout failed: {}", msg),
            WithdrawalError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WithdrawalError::Conflict(_) | WithdrawalError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for WithdrawalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for WithdrawalError {}

impl From<DomainError> for WithdrawalError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InsufficientFunds => WithdrawalError::InsufficientFunds {
                available: money_detail(&err, "available"),
                requested: money_detail(&err, "requested"),
            },
            ErrorCode::DuplicateRequest => WithdrawalError::DuplicateRequest,
            ErrorCode::Conflict => WithdrawalError::Conflict(err.message().to_string()),
            ErrorCode::InvalidStateTransition => WithdrawalError::InvalidState {
                current: err
                    .details
                    .get("current")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                attempted: err.message().to_string(),
            },
            _ => WithdrawalError::Infrastructure(err.to_string()),
        }
    }
}

impl From<WithdrawalError> for DomainError {
    fn from(err: WithdrawalError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_request_round_trips() {
        let domain: DomainError = WithdrawalError::DuplicateRequest.into();
        assert_eq!(domain.code, ErrorCode::DuplicateRequest);
        let back: WithdrawalError = domain.into();
        assert_eq!(back, WithdrawalError::DuplicateRequest);
    }

    #[test]
    fn state_conflict_keeps_current_status() {
        let domain = DomainError::new(ErrorCode::InvalidStateTransition, "reject")
            .with_detail("current", "paid");
        let err: WithdrawalError = domain.into();
        assert_eq!(
            err,
            WithdrawalError::InvalidState {
                current: "paid".to_string(),
                attempted: "reject".to_string(),
            }
        );
    }

    #[test]
    fn only_races_and_infrastructure_retry() {
        assert!(WithdrawalError::Conflict("moved".into()).is_retryable());
        assert!(!WithdrawalError::DuplicateRequest.is_retryable());
        assert!(!WithdrawalError::Payout("account closed".into()).is_retryable());
    }
}
