//! Mock payment gateway for testing.
//!
//! Provides a configurable implementation of `PaymentGateway` for unit and
//! integration tests. Supports:
//! - Error injection (one-shot or per method)
//! - Switching orders and payouts off to exercise the dev paths
//! - A configurable payout status and artificial payout latency
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{
    CreateOrderRequest, CreatePayoutRequest, GatewayOrder, PaymentError, PaymentGateway, Payout,
    PayoutStatus,
};

/// Mock payment gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new();
/// gateway.set_payout_status(PayoutStatus::Queued);
/// gateway.set_method_error("create_order", PaymentError::network("refused"));
///
/// let handler = InitiateJoinHandler::new(..., Arc::new(gateway.clone()), ...);
/// assert_eq!(gateway.call_count("create_order"), 1);
/// ```
#[derive(Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

struct MockState {
    key_id: String,
    orders_enabled: bool,
    payouts_enabled: bool,
    payout_status: PayoutStatus,
    payout_utr: Option<String>,
    payout_delay: Option<Duration>,

    /// Error to return on the next call (consumed).
    next_error: Option<PaymentError>,

    /// Errors returned on every call to a method.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            key_id: "rzp_test_mock".to_string(),
            orders_enabled: true,
            payouts_enabled: true,
            payout_status: PayoutStatus::Processed,
            payout_utr: Some("UTRMOCK0001".to_string()),
            payout_delay: None,
            next_error: None,
            method_errors: HashMap::new(),
            call_log: Vec::new(),
        }
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway with no credentials: orders and payouts both take the dev path.
    pub fn unconfigured() -> Self {
        let mock = Self::new();
        {
            let mut state = mock.state();
            state.orders_enabled = false;
            state.payouts_enabled = false;
        }
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().expect("MockPaymentGateway: state lock poisoned")
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    pub fn set_orders_enabled(&self, enabled: bool) {
        self.state().orders_enabled = enabled;
    }

    pub fn set_payouts_enabled(&self, enabled: bool) {
        self.state().payouts_enabled = enabled;
    }

    /// Status reported for subsequently created payouts.
    pub fn set_payout_status(&self, status: PayoutStatus) {
        self.state().payout_status = status;
    }

    pub fn set_payout_utr(&self, utr: Option<String>) {
        self.state().payout_utr = utr;
    }

    /// Makes `create_payout` sleep before answering.
    pub fn set_payout_delay(&self, delay: Duration) {
        self.state().payout_delay = Some(delay);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentGateway {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn mock_id(prefix: &str) -> String {
    format!("{}_mock_{}", prefix, uuid::Uuid::new_v4().simple())
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    fn key_id(&self) -> String {
        self.state().key_id.clone()
    }

    fn orders_enabled(&self) -> bool {
        self.state().orders_enabled
    }

    fn payouts_enabled(&self) -> bool {
        self.state().payouts_enabled
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError> {
        self.record_call(
            "create_order",
            vec![request.amount.minor().to_string(), request.receipt.clone()],
        );
        self.check_error("create_order")?;

        Ok(GatewayOrder {
            id: mock_id("order"),
            amount: request.amount,
            currency: request.currency,
        })
    }

    async fn create_payout(&self, request: CreatePayoutRequest) -> Result<Payout, PaymentError> {
        self.record_call(
            "create_payout",
            vec![
                request.amount.minor().to_string(),
                request.destination.mode().to_string(),
                request.reference.clone(),
            ],
        );
        self.check_error("create_payout")?;

        let delay = self.state().payout_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        let failure_reason = state
            .payout_status
            .is_failure()
            .then(|| "Beneficiary bank rejected the transfer".to_string());
        let utr = match state.payout_status {
            PayoutStatus::Processed => state.payout_utr.clone(),
            _ => None,
        };
        Ok(Payout {
            id: mock_id("pout"),
            status: state.payout_status,
            utr,
            failure_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use crate::domain::withdrawal::PayoutDestination;

    fn order_request() -> CreateOrderRequest {
        CreateOrderRequest {
            amount: Money::from_minor(20_000),
            currency: "INR".to_string(),
            receipt: "join_1".to_string(),
        }
    }

    fn payout_request() -> CreatePayoutRequest {
        CreatePayoutRequest {
            amount: Money::from_minor(15_000),
            currency: "INR".to_string(),
            destination: PayoutDestination::Upi {
                vpa: "owner@okbank".to_string(),
            },
            reference: "wd_1".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_orders_with_mock_ids() {
        let gateway = MockPaymentGateway::new();
        let order = gateway.create_order(order_request()).await.unwrap();

        assert!(order.id.starts_with("order_mock_"));
        assert_eq!(order.amount, Money::from_minor(20_000));
        assert!(gateway.was_called("create_order"));
    }

    #[tokio::test]
    async fn one_shot_error_is_consumed() {
        let gateway = MockPaymentGateway::new();
        gateway.set_error(PaymentError::network("refused"));

        assert!(gateway.create_order(order_request()).await.is_err());
        assert!(gateway.create_order(order_request()).await.is_ok());
        assert_eq!(gateway.call_count("create_order"), 2);
    }

    #[tokio::test]
    async fn method_error_persists_until_cleared() {
        let gateway = MockPaymentGateway::new();
        gateway.set_method_error("create_payout", PaymentError::provider("down"));

        assert!(gateway.create_payout(payout_request()).await.is_err());
        assert!(gateway.create_payout(payout_request()).await.is_err());
        gateway.clear_errors();
        assert!(gateway.create_payout(payout_request()).await.is_ok());
    }

    #[tokio::test]
    async fn failed_payout_carries_reason_and_no_utr() {
        let gateway = MockPaymentGateway::new();
        gateway.set_payout_status(PayoutStatus::Reversed);

        let payout = gateway.create_payout(payout_request()).await.unwrap();
        assert!(payout.id.starts_with("pout_mock_"));
        assert!(payout.utr.is_none());
        assert!(payout.failure_reason.is_some());
    }

    #[test]
    fn unconfigured_disables_both_flows() {
        let gateway = MockPaymentGateway::unconfigured();
        assert!(!gateway.orders_enabled());
        assert!(!gateway.payouts_enabled());
    }
}
