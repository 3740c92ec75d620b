//! VerifyPaymentHandler - Command handler for client-side checkout confirmation.
//!
//! The client posts the ids and signature the checkout widget returned. The
//! signature is checked before anything is looked up; after that the payment
//! follows the same routing as a webhook capture, so whichever of the two
//! arrives second sees a replay.

use std::sync::Arc;

use crate::domain::join::JoinError;
use crate::domain::ledger::GroupTransaction;
use crate::domain::webhook::{CapturedPayment, SignatureVerifier};
use crate::ports::{GroupTransactionRepository, JoinIntentRepository};

use crate::application::handlers::join::JoinFinalizer;

use super::capture::{CaptureMatch, CaptureRouter};

/// Command to verify a completed checkout.
#[derive(Debug, Clone)]
pub struct VerifyPaymentCommand {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Result of verification.
#[derive(Debug, Clone)]
pub struct VerifyPaymentResult {
    pub transaction: GroupTransaction,
    /// True when the payment had already been finalized.
    pub replayed: bool,
}

/// Handler for payment verification.
pub struct VerifyPaymentHandler {
    /// Keyed with the gateway API secret, not the webhook secret.
    checkout_verifier: SignatureVerifier,
    router: CaptureRouter,
}

impl VerifyPaymentHandler {
    pub fn new(
        checkout_verifier: SignatureVerifier,
        intents: Arc<dyn JoinIntentRepository>,
        transactions: Arc<dyn GroupTransactionRepository>,
        finalizer: Arc<JoinFinalizer>,
    ) -> Self {
        Self {
            checkout_verifier,
            router: CaptureRouter::new(intents, transactions, finalizer),
        }
    }

    pub async fn handle(&self, cmd: VerifyPaymentCommand) -> Result<VerifyPaymentResult, JoinError> {
        if cmd.order_id.trim().is_empty() {
            return Err(JoinError::validation("order_id", "order_id is required"));
        }
        if cmd.payment_id.trim().is_empty() {
            return Err(JoinError::validation("payment_id", "payment_id is required"));
        }
        if self.checkout_verifier.is_unconfigured() {
            return Err(JoinError::gateway("Payment gateway is not configured", false));
        }

        self.checkout_verifier
            .verify_checkout(&cmd.order_id, &cmd.payment_id, &cmd.signature)
            .map_err(|_| {
                tracing::warn!(order_id = %cmd.order_id, "Checkout signature rejected");
                JoinError::InvalidSignature
            })?;

        let captured = CapturedPayment {
            order_id: cmd.order_id,
            payment_id: cmd.payment_id,
        };
        match self.router.route(&captured).await? {
            CaptureMatch::Finalized(result) => {
                tracing::info!(
                    order_id = %captured.order_id,
                    transaction_id = %result.transaction.id,
                    replayed = result.replayed,
                    "Payment verified"
                );
                Ok(VerifyPaymentResult {
                    transaction: result.transaction,
                    replayed: result.replayed,
                })
            }
            CaptureMatch::AlreadyProcessed(transaction) => Ok(VerifyPaymentResult {
                transaction,
                replayed: true,
            }),
            CaptureMatch::Unmatched => Err(JoinError::PaymentNotFound {
                order_id: captured.order_id,
            }),
        }
    }
}
