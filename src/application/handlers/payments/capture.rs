//! Routes a captured gateway payment to the purchase it pays for.
//!
//! Shared by the webhook ingestor and client-side verification, which may
//! race each other for the same payment in any order.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::join::{JoinError, JoinIntent, JoinIntentStatus};
use crate::domain::ledger::GroupTransaction;
use crate::domain::webhook::CapturedPayment;
use crate::ports::{GroupTransactionRepository, JoinIntentRepository};

use crate::application::handlers::join::{
    FinalizeJoinCommand, FinalizeJoinResult, FinalizeSource, JoinFinalizer,
};

/// Where a captured payment ended up.
#[derive(Debug, Clone)]
pub(crate) enum CaptureMatch {
    /// The finalizer ran; `replayed` tells whether it had already run.
    Finalized(FinalizeJoinResult),
    /// No open purchase matched but the payment is already recorded.
    AlreadyProcessed(GroupTransaction),
    Unmatched,
}

pub(crate) struct CaptureRouter {
    intents: Arc<dyn JoinIntentRepository>,
    transactions: Arc<dyn GroupTransactionRepository>,
    finalizer: Arc<JoinFinalizer>,
}

impl CaptureRouter {
    pub(crate) fn new(
        intents: Arc<dyn JoinIntentRepository>,
        transactions: Arc<dyn GroupTransactionRepository>,
        finalizer: Arc<JoinFinalizer>,
    ) -> Self {
        Self {
            intents,
            transactions,
            finalizer,
        }
    }

    /// Matches by order id against join intents, then pending direct
    /// purchases, then falls back to the payment id.
    pub(crate) async fn route(&self, captured: &CapturedPayment) -> Result<CaptureMatch, JoinError> {
        if let Some(intent) = self.intents.find_by_order_id(&captured.order_id).await? {
            if let Some(paid) = self.claim_intent(intent, &captured.payment_id).await? {
                let payment_id = paid
                    .payment_id
                    .clone()
                    .unwrap_or_else(|| captured.payment_id.clone());
                let result = self
                    .finalizer
                    .handle(FinalizeJoinCommand {
                        source: FinalizeSource::Intent(paid),
                        payment_id,
                    })
                    .await?;
                return Ok(CaptureMatch::Finalized(result));
            }
        }

        if let Some(pending) = self
            .transactions
            .find_pending_by_order_id(&captured.order_id)
            .await?
        {
            let result = self
                .finalizer
                .handle(FinalizeJoinCommand {
                    source: FinalizeSource::PendingTransaction(pending),
                    payment_id: captured.payment_id.clone(),
                })
                .await?;
            return Ok(CaptureMatch::Finalized(result));
        }

        if let Some(existing) = self
            .transactions
            .find_by_payment_id(&captured.payment_id)
            .await?
        {
            return Ok(CaptureMatch::AlreadyProcessed(existing));
        }

        Ok(CaptureMatch::Unmatched)
    }

    /// Moves an initiated intent to paid, or returns an already paid one.
    /// Failed and expired intents do not match.
    async fn claim_intent(
        &self,
        mut intent: JoinIntent,
        payment_id: &str,
    ) -> Result<Option<JoinIntent>, JoinError> {
        match intent.status {
            JoinIntentStatus::Paid => return Ok(Some(intent)),
            JoinIntentStatus::Initiated => {}
            _ => return Ok(None),
        }

        let now = Timestamp::now();
        if self.intents.mark_paid(&intent.id, payment_id, now).await? {
            intent
                .mark_paid(payment_id, now)
                .map_err(|_| JoinError::invalid_state(intent.status.as_str(), "mark paid"))?;
            return Ok(Some(intent));
        }

        let current = self.intents.find_by_id(&intent.id).await?;
        Ok(current.filter(|i| i.status == JoinIntentStatus::Paid))
    }
}
