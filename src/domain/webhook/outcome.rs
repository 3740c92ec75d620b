//! What the ingestor did with a delivery.

use serde::Serialize;

use crate::domain::foundation::TransactionId;

/// Result of processing one verified webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The payment was finalized now.
    Processed { transaction_id: TransactionId },
    /// A transaction for this payment id already exists.
    AlreadyProcessed,
    /// The event lacked an order or payment id.
    MissingIds,
    /// Nothing matches the order id. Needs reconciliation.
    Unmatched,
    /// Event type the ingestor does not act on.
    Ignored,
    /// No webhook secret is configured; the delivery was not inspected.
    Unconfigured,
    /// Processing failed after the signature was accepted.
    Failed,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Processed { .. } => "ok",
            WebhookOutcome::AlreadyProcessed => "already_processed",
            WebhookOutcome::MissingIds => "missing_ids",
            WebhookOutcome::Unmatched => "no_pending_tx",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Unconfigured => "ok",
            WebhookOutcome::Failed => "error",
        }
    }
}

/// Acknowledgement body returned to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

impl From<&WebhookOutcome> for WebhookAck {
    fn from(outcome: &WebhookOutcome) -> Self {
        WebhookAck {
            status: outcome.as_str(),
        }
    }
}
