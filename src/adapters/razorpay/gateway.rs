//! Razorpay gateway adapter.
//!
//! Implements `PaymentGateway` over the Razorpay REST API: checkout orders
//! through `/v1/orders` and RazorpayX payouts through `/v1/payouts`.
//!
//! # Security
//!
//! - The key secret is held as `secrecy::SecretString` and only exposed to
//!   build the basic-auth header
//! - Payouts carry the withdrawal id as `X-Payout-Idempotency`, so a retried
//!   approval cannot pay twice at the provider

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::foundation::Money;
use crate::domain::withdrawal::PayoutDestination;
use crate::ports::{
    CreateOrderRequest, CreatePayoutRequest, GatewayOrder, PaymentError, PaymentErrorCode,
    PaymentGateway, Payout, PayoutStatus,
};

pub const DEFAULT_API_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    key_id: String,
    key_secret: SecretString,

    /// RazorpayX source account; payouts are disabled without it.
    payout_account_number: Option<String>,

    api_base_url: String,
    timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: SecretString::new(key_secret.into()),
            payout_account_number: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_payout_account(mut self, account_number: impl Into<String>) -> Self {
        let account_number = account_number.into();
        self.payout_account_number = (!account_number.trim().is_empty()).then_some(account_number);
        self
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn has_credentials(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("payout_account_number", &self.payout_account_number)
            .field("api_base_url", &self.api_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Razorpay payment gateway adapter.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self {
            config,
            http_client,
        }
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<reqwest::Response, PaymentError> {
        let url = format!("{}{}", self.config.api_base_url, path);
        let mut request = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(body);
        if let Some(key) = idempotency_key {
            request = request.header("X-Payout-Idempotency", key);
        }

        let response = request.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(path, status = %status, error = %error_text, "Razorpay call failed");
            return Err(status_error(status, &error_text));
        }

        Ok(response)
    }
}

/// Maps a reqwest failure. Only a failed connect guarantees nothing was sent.
fn transport_error(err: reqwest::Error) -> PaymentError {
    if err.is_connect() {
        PaymentError::network(err.to_string())
    } else {
        PaymentError::timeout(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn status_error(status: reqwest::StatusCode, body: &str) -> PaymentError {
    let code = match status.as_u16() {
        400 => PaymentErrorCode::InvalidRequest,
        401 | 403 => PaymentErrorCode::AuthenticationError,
        404 => PaymentErrorCode::NotFound,
        429 => PaymentErrorCode::RateLimitExceeded,
        _ => PaymentErrorCode::ProviderError,
    };

    match serde_json::from_str::<RazorpayErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .error
                .description
                .unwrap_or_else(|| format!("Razorpay returned {}", status));
            let error = PaymentError::new(code, message);
            match parsed.error.code {
                Some(provider_code) => error.with_provider_code(provider_code),
                None => error,
            }
        }
        Err(_) => PaymentError::new(code, format!("Razorpay returned {}: {}", status, body)),
    }
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayPayout {
    id: String,
    status: String,
    #[serde(default)]
    utr: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

impl From<RazorpayPayout> for Payout {
    fn from(p: RazorpayPayout) -> Self {
        Payout {
            id: p.id,
            status: PayoutStatus::parse(&p.status),
            utr: p.utr.filter(|u| !u.is_empty()),
            failure_reason: p.failure_reason.filter(|r| !r.is_empty()),
        }
    }
}

fn fund_account(destination: &PayoutDestination) -> Value {
    match destination {
        PayoutDestination::Upi { vpa } => json!({
            "account_type": "vpa",
            "vpa": { "address": vpa },
        }),
        PayoutDestination::Bank {
            account_number,
            ifsc,
            holder,
        } => json!({
            "account_type": "bank_account",
            "bank_account": {
                "name": holder,
                "ifsc": ifsc,
                "account_number": account_number,
            },
        }),
    }
}

fn payout_body(source_account: &str, request: &CreatePayoutRequest) -> Value {
    json!({
        "account_number": source_account,
        "fund_account": fund_account(&request.destination),
        "amount": request.amount.minor(),
        "currency": request.currency,
        "mode": request.destination.mode(),
        "purpose": "payout",
        "queue_if_low_balance": true,
        "reference_id": request.reference,
    })
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> String {
        self.config.key_id.clone()
    }

    fn orders_enabled(&self) -> bool {
        self.config.has_credentials()
    }

    fn payouts_enabled(&self) -> bool {
        self.config.has_credentials() && self.config.payout_account_number.is_some()
    }

    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, PaymentError> {
        let body = json!({
            "amount": request.amount.minor(),
            "currency": request.currency,
            "receipt": request.receipt,
        });

        let response = self.post("/v1/orders", &body, None).await?;
        let order: RazorpayOrder = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Razorpay order: {}", e))
        })?;

        tracing::debug!(order_id = %order.id, amount = order.amount, "Razorpay order created");
        Ok(GatewayOrder {
            id: order.id,
            amount: Money::from_minor(order.amount),
            currency: order.currency,
        })
    }

    async fn create_payout(&self, request: CreatePayoutRequest) -> Result<Payout, PaymentError> {
        let source_account = self
            .config
            .payout_account_number
            .as_deref()
            .ok_or_else(|| PaymentError::invalid_request("No payout source account configured"))?;

        let body = payout_body(source_account, &request);
        let response = self
            .post("/v1/payouts", &body, Some(&request.reference))
            .await?;
        let payout: RazorpayPayout = response.json().await.map_err(|e| {
            PaymentError::timeout(format!("Unreadable Razorpay payout response: {}", e))
        })?;

        tracing::info!(
            payout_id = %payout.id,
            status = %payout.status,
            reference = %request.reference,
            "Razorpay payout created"
        );
        Ok(payout.into())
    }
}
