//! Payment gateway port.
//!
//! Covers the two outbound calls the money flows make: creating a checkout
//! order for a seat purchase and creating a payout for a withdrawal.
//! Inbound callbacks are verified in `domain::webhook`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, Money};
use crate::domain::withdrawal::PayoutDestination;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key id the client uses to open checkout.
    fn key_id(&self) -> String;

    /// False when no API credentials are configured.
    fn orders_enabled(&self) -> bool;

    /// False when no payout source account is configured.
    fn payouts_enabled(&self) -> bool;

    /// Creates a checkout order.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError>;

    /// Creates a payout to an external account.
    ///
    /// A `Timeout` error means the outcome is unknown: the payout may or may
    /// not have been created.
    async fn create_payout(&self, request: CreatePayoutRequest) -> Result<Payout, PaymentError>;
}

/// Request to create a checkout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub amount: Money,
    pub currency: String,
    /// Merchant reference echoed back by the provider.
    pub receipt: String,
}

/// Checkout order created at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: Money,
    pub currency: String,
}

/// Request to pay out to an external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePayoutRequest {
    pub amount: Money,
    pub currency: String,
    pub destination: PayoutDestination,
    /// Withdrawal id, used as the provider idempotency key.
    pub reference: String,
}

/// Provider-side payout status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Processed,
    Processing,
    Queued,
    Pending,
    Failed,
    Reversed,
    Cancelled,
}

impl PayoutStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "processed" => PayoutStatus::Processed,
            "queued" => PayoutStatus::Queued,
            "pending" => PayoutStatus::Pending,
            "failed" => PayoutStatus::Failed,
            "reversed" => PayoutStatus::Reversed,
            "cancelled" => PayoutStatus::Cancelled,
            _ => PayoutStatus::Processing,
        }
    }

    /// The provider will not send this money.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PayoutStatus::Failed | PayoutStatus::Reversed | PayoutStatus::Cancelled
        )
    }
}

/// Payout created at the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub status: PayoutStatus,
    /// Bank settlement reference, once known.
    pub utr: Option<String>,
    pub failure_reason: Option<String>,
}

/// Errors from payment gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    /// Provider's error code, if available.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    /// True when the call may have taken effect at the provider.
    pub fn is_outcome_unknown(&self) -> bool {
        self.code == PaymentErrorCode::Timeout
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        let code = match err.code {
            PaymentErrorCode::InvalidRequest => ErrorCode::ValidationFailed,
            PaymentErrorCode::NotFound => ErrorCode::NotFound,
            _ => ErrorCode::ExternalServiceError,
        };
        DomainError::new(code, err.message)
    }
}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Connection could not be established; nothing was sent.
    NetworkError,
    /// No response within the deadline; outcome unknown.
    Timeout,
    AuthenticationError,
    /// The provider rejected the request as invalid.
    InvalidRequest,
    NotFound,
    RateLimitExceeded,
    ProviderError,
    Unknown,
}

impl PaymentErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::Timeout => "timeout",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_gateway_is_object_safe() {
        fn _accepts_dyn(_gateway: &dyn PaymentGateway) {}
    }

    #[test]
    fn only_network_and_rate_limit_retry() {
        assert!(PaymentErrorCode::NetworkError.is_retryable());
        assert!(PaymentErrorCode::RateLimitExceeded.is_retryable());
        assert!(!PaymentErrorCode::Timeout.is_retryable());
        assert!(!PaymentErrorCode::InvalidRequest.is_retryable());
    }

    #[test]
    fn timeout_means_outcome_unknown() {
        assert!(PaymentError::timeout("30s elapsed").is_outcome_unknown());
        assert!(!PaymentError::network("refused").is_outcome_unknown());
    }

    #[test]
    fn payout_status_parsing() {
        assert_eq!(PayoutStatus::parse("processed"), PayoutStatus::Processed);
        assert_eq!(PayoutStatus::parse("queued"), PayoutStatus::Queued);
        assert_eq!(PayoutStatus::parse("something_new"), PayoutStatus::Processing);
        assert!(PayoutStatus::Reversed.is_failure());
        assert!(!PayoutStatus::Pending.is_failure());
    }

    #[test]
    fn payment_error_display() {
        let err = PaymentError::invalid_request("amount too small");
        assert_eq!(err.to_string(), "invalid_request: amount too small");
    }
}
