//! Join-specific error types.
//!
//! Errors raised while initiating, confirming or finalizing a seat purchase.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Invite(..) | see `InviteError` |
//! | GroupNotFound | 404 |
//! | IntentNotFound | 404 |
//! | PaymentNotFound | 404 |
//! | AlreadyMember | 409 |
//! | GroupFull | 409 |
//! | GroupArchived | 409 |
//! | InvalidState | 409 |
//! | Conflict | 409 |
//! | InsufficientFunds | 402 |
//! | DevPaymentsDisabled | 404 |
//! | Forbidden | 403 |
//! | InvalidSignature | 400 |
//! | ValidationFailed | 400 |
//! | Gateway | 502 |
//! | NoOwner | 500 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, GroupId, JoinIntentId, Money};
use crate::domain::invite::InviteError;
use crate::domain::ledger::money_detail;

/// Join-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The invite failed one of its checks.
    Invite(InviteError),

    GroupNotFound(GroupId),

    /// The user already holds a non-left membership in the group.
    AlreadyMember,

    /// No seats are left.
    GroupFull,

    GroupArchived,

    /// Wallet balance does not cover the seat price.
    InsufficientFunds { available: Money, requested: Money },

    /// Dev confirmation requested while dev payments are switched off.
    DevPaymentsDisabled,

    IntentNotFound(JoinIntentId),

    /// No intent or pending transaction matches a verified payment.
    PaymentNotFound { order_id: String },

    /// The intent belongs to someone else.
    Forbidden,

    /// The intent or transaction is not in a state that allows the operation.
    InvalidState { current: String, attempted: String },

    /// A concurrent operation won; retrying observes its result.
    Conflict(String),

    /// The group has no owner membership. Integrity violation.
    NoOwner { group_id: String },

    /// Checkout signature did not verify.
    InvalidSignature,

    ValidationFailed { field: String, message: String },

    /// The payment provider rejected or failed the call.
    Gateway { message: String, retryable: bool },

    Infrastructure(String),
}

impl JoinError {
    pub fn gateway(message: impl Into<String>, retryable: bool) -> Self {
        JoinError::Gateway {
            message: message.into(),
            retryable,
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        JoinError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        JoinError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        JoinError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            JoinError::Invite(e) => e.code(),
            JoinError::GroupNotFound(_) => ErrorCode::GroupNotFound,
            JoinError::AlreadyMember => ErrorCode::AlreadyMember,
            JoinError::GroupFull => ErrorCode::GroupFull,
            JoinError::GroupArchived => ErrorCode::GroupArchived,
            JoinError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            JoinError::DevPaymentsDisabled => ErrorCode::FeatureDisabled,
            JoinError::IntentNotFound(_) => ErrorCode::JoinIntentNotFound,
            JoinError::PaymentNotFound { .. } => ErrorCode::NotFound,
            JoinError::Forbidden => ErrorCode::Forbidden,
            JoinError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            JoinError::Conflict(_) => ErrorCode::Conflict,
            JoinError::NoOwner { .. } => ErrorCode::NoOwner,
            JoinError::InvalidSignature => ErrorCode::InvalidSignature,
            JoinError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            JoinError::Gateway { .. } => ErrorCode::ExternalServiceError,
            JoinError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            JoinError::Invite(e) => e.message(),
            JoinError::GroupNotFound(id) => format!("Group not found: {}", id),
            JoinError::AlreadyMember => "You are already a member of this group".to_string(),
            JoinError::GroupFull => "This group has no seats left".to_string(),
            JoinError::GroupArchived => "This group is no longer accepting members".to_string(),
            JoinError::InsufficientFunds {
                available,
                requested,
            } => format!(
                "Insufficient wallet balance: {} available, {} required",
                available, requested
            ),
            JoinError::DevPaymentsDisabled => "Dev payments are disabled".to_string(),
            JoinError::IntentNotFound(id) => format!("Join intent not found: {}", id),
            JoinError::PaymentNotFound { order_id } => {
                format!("No pending purchase found for order {}", order_id)
            }
            JoinError::Forbidden => "This join intent belongs to another user".to_string(),
            JoinError::InvalidState { current, attempted } => {
                format!("Cannot {} while {}", attempted, current)
            }
            JoinError::Conflict(msg) => format!("Concurrent update: {}", msg),
            JoinError::NoOwner { group_id } => format!("Group {} has no owner", group_id),
            JoinError::InvalidSignature => "Invalid payment signature".to_string(),
            JoinError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            JoinError::Gateway { message, .. } => format!("Payment provider error: {}", message),
            JoinError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            JoinError::Gateway { retryable, .. } => *retryable,
            JoinError::Conflict(_) | JoinError::Infrastructure(_) => true,
            _ => false,
        }
    }

    /// True for errors that indicate inconsistent stored data.
    pub fn is_integrity_violation(&self) -> bool {
        self.code().is_integrity_violation()
    }
}

impl std::fmt::Display for JoinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for JoinError {}

impl From<InviteError> for JoinError {
    fn from(err: InviteError) -> Self {
        JoinError::Invite(err)
    }
}

impl From<DomainError> for JoinError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::MissingCode => JoinError::Invite(InviteError::MissingCode),
            ErrorCode::InviteNotFound => JoinError::Invite(InviteError::NotFound),
            ErrorCode::InviteDisabled => JoinError::Invite(InviteError::Disabled),
            ErrorCode::InviteExpired => JoinError::Invite(InviteError::Expired),
            ErrorCode::InviteMaxUses => JoinError::Invite(InviteError::MaxUses),
            ErrorCode::AlreadyMember => JoinError::AlreadyMember,
            ErrorCode::GroupFull => JoinError::GroupFull,
            ErrorCode::GroupArchived => JoinError::GroupArchived,
            ErrorCode::InsufficientFunds => JoinError::InsufficientFunds {
                available: money_detail(&err, "available"),
                requested: money_detail(&err, "requested"),
            },
            ErrorCode::Conflict => JoinError::Conflict(err.message().to_string()),
            ErrorCode::InvalidStateTransition => JoinError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.to_string(),
            },
            ErrorCode::NoOwner => JoinError::NoOwner {
                group_id: err
                    .details
                    .get("group_id")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => JoinError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message().to_string(),
            },
            _ => JoinError::Infrastructure(err.to_string()),
        }
    }
}

impl From<JoinError> for DomainError {
    fn from(err: JoinError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
