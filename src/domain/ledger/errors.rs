//! Wallet operation errors.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InsufficientFunds | 409 |
//! | AmountOutOfRange | 400 |
//! | BalanceLimitExceeded | 409 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{DomainError, ErrorCode, Money};

/// Errors from wallet operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    InsufficientFunds { available: Money, requested: Money },
    AmountOutOfRange { min: Money, max: Money, requested: Money },
    BalanceLimitExceeded { limit: Money },
    Infrastructure(String),
}

impl WalletError {
    pub fn code(&self) -> ErrorCode {
        match self {
            WalletError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            WalletError::AmountOutOfRange { .. } => ErrorCode::OutOfRange,
            WalletError::BalanceLimitExceeded { .. } => ErrorCode::BalanceLimitExceeded,
            WalletError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            WalletError::InsufficientFunds { available, requested } => format!(
                "Insufficient wallet balance: {} available, {} requested",
                available, requested
            ),
            WalletError::AmountOutOfRange { min, max, requested } => format!(
                "Amount {} is outside the allowed range {} to {}",
                requested, min, max
            ),
            WalletError::BalanceLimitExceeded { limit } => {
                format!("Wallet balance cannot exceed {}", limit)
            }
            WalletError::Infrastructure(msg) => format!("Internal error: {}", msg),
        }
    }

    /// Infrastructure failures may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::Infrastructure(_))
    }
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for WalletError {}

impl From<DomainError> for WalletError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InsufficientFunds => WalletError::InsufficientFunds {
                available: money_detail(&err, "available"),
                requested: money_detail(&err, "requested"),
            },
            _ => WalletError::Infrastructure(err.to_string()),
        }
    }
}

impl From<WalletError> for DomainError {
    fn from(err: WalletError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

/// Reads a minor-unit amount stored in an error's details.
pub(crate) fn money_detail(err: &DomainError, key: &str) -> Money {
    err.details
        .get(key)
        .and_then(|v| v.parse::<i64>().ok())
        .map(Money::from_minor)
        .unwrap_or(Money::ZERO)
}

/// Builds the error ledgers return when a conditional decrement fails.
pub fn insufficient_funds(available: Money, requested: Money) -> DomainError {
    DomainError::new(ErrorCode::InsufficientFunds, "Insufficient balance")
        .with_detail("available", available.minor().to_string())
        .with_detail("requested", requested.minor().to_string())
}
