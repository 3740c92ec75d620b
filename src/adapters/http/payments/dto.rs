//! Request and response types for payment endpoints.

use serde::{Deserialize, Serialize};

use crate::adapters::http::dto::TransactionResponse;
use crate::application::handlers::VerifyPaymentResult;

/// Body of `POST /api/payments/verify`, as returned by the checkout widget.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub transaction: TransactionResponse,
    pub replayed: bool,
}

impl From<VerifyPaymentResult> for VerifyPaymentResponse {
    fn from(result: VerifyPaymentResult) -> Self {
        Self {
            transaction: result.transaction.into(),
            replayed: result.replayed,
        }
    }
}

/// Body of a rejected webhook delivery.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRejection {
    pub status: &'static str,
    pub message: String,
}
