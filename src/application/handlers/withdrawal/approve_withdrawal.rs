//! ApproveWithdrawalHandler - Command handler for approving a withdrawal and
//! sending its payout.
//!
//! Payout outcomes:
//!
//! | Provider result | Request status | Reserved funds |
//! |-----------------|----------------|----------------|
//! | processed | paid | kept |
//! | queued / pending / processing | processing | kept |
//! | failed / reversed / cancelled | rejected | restored |
//! | error with known outcome | rejected | restored |
//! | timeout | processing | kept, needs reconciliation |
//!
//! Without payout credentials the request is marked paid with a dev payout id.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{Timestamp, WithdrawalId};
use crate::domain::withdrawal::{WithdrawalError, WithdrawalRequest, WithdrawalStatus};
use crate::ports::{
    CreatePayoutRequest, PaymentGateway, PayoutStatus, PlatformSettingsSource,
    WithdrawalRepository,
};

#[derive(Debug, Clone)]
pub struct ApproveWithdrawalCommand {
    pub withdrawal_id: WithdrawalId,
}

/// What happened to the payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutOutcome {
    /// Money has left; the request is paid.
    Paid,
    /// The provider accepted the payout but has not completed it.
    InFlight,
    /// The call timed out; the payout may or may not exist.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct ApproveWithdrawalResult {
    pub request: WithdrawalRequest,
    pub outcome: PayoutOutcome,
}

/// Handler for withdrawal approval.
pub struct ApproveWithdrawalHandler {
    withdrawals: Arc<dyn WithdrawalRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: Arc<dyn PlatformSettingsSource>,
    payout_timeout: Duration,
}

impl ApproveWithdrawalHandler {
    pub fn new(
        withdrawals: Arc<dyn WithdrawalRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<dyn PlatformSettingsSource>,
        payout_timeout: Duration,
    ) -> Self {
        Self {
            withdrawals,
            gateway,
            settings,
            payout_timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: ApproveWithdrawalCommand,
    ) -> Result<ApproveWithdrawalResult, WithdrawalError> {
        let mut request = self
            .withdrawals
            .find_by_id(&cmd.withdrawal_id)
            .await?
            .ok_or(WithdrawalError::NotFound(cmd.withdrawal_id))?;
        if request.status != WithdrawalStatus::Requested {
            return Err(WithdrawalError::invalid_state(request.status.as_str(), "approve"));
        }
        let destination = request.payout_details.destination(request.payout_method)?;

        let now = Timestamp::now();
        request
            .approve(now)
            .and_then(|_| request.start_processing(now))
            .map_err(|_| WithdrawalError::invalid_state(request.status.as_str(), "approve"))?;
        if !self
            .withdrawals
            .update_if_status(&request, WithdrawalStatus::Requested)
            .await?
        {
            return Err(WithdrawalError::Conflict(format!(
                "withdrawal {} changed during approval",
                request.id
            )));
        }

        if !self.gateway.payouts_enabled() {
            let payout_id = format!("dev_payout_{}", uuid::Uuid::new_v4().simple());
            request.record_payout(payout_id, None, now);
            request
                .mark_paid(None, now)
                .map_err(|_| WithdrawalError::invalid_state(request.status.as_str(), "pay"))?;
            self.write_processing(&request).await?;
            tracing::info!(withdrawal_id = %request.id, amount = %request.amount, "Withdrawal paid in dev mode");
            return Ok(ApproveWithdrawalResult {
                request,
                outcome: PayoutOutcome::Paid,
            });
        }

        let currency = self.settings.current().await?.currency;
        let call = self.gateway.create_payout(CreatePayoutRequest {
            amount: request.amount,
            currency,
            destination,
            reference: request.id.to_string(),
        });

        let payout = match tokio::time::timeout(self.payout_timeout, call).await {
            Err(_) => return Ok(self.unknown_outcome(request, "payout call timed out")),
            Ok(Err(e)) if e.is_outcome_unknown() => {
                return Ok(self.unknown_outcome(request, &e.message))
            }
            Ok(Err(e)) => {
                self.refund(&request, &format!("Payout API error: {}", e.message))
                    .await?;
                return Err(WithdrawalError::Payout(e.message));
            }
            Ok(Ok(payout)) => payout,
        };

        let now = Timestamp::now();
        if payout.status.is_failure() {
            let reason = payout
                .failure_reason
                .clone()
                .unwrap_or_else(|| format!("Payout {:?}", payout.status).to_lowercase());
            self.refund(&request, &reason).await?;
            return Err(WithdrawalError::Payout(reason));
        }

        request.record_payout(payout.id.clone(), payout.utr.clone(), now);
        let outcome = if payout.status == PayoutStatus::Processed {
            request
                .mark_paid(payout.utr.clone(), now)
                .map_err(|_| WithdrawalError::invalid_state(request.status.as_str(), "pay"))?;
            PayoutOutcome::Paid
        } else {
            PayoutOutcome::InFlight
        };
        self.write_processing(&request).await?;

        tracing::info!(
            withdrawal_id = %request.id,
            payout_id = %payout.id,
            status = request.status.as_str(),
            "Withdrawal payout sent"
        );
        Ok(ApproveWithdrawalResult { request, outcome })
    }

    /// Writes the post-payout state over the `processing` row.
    async fn write_processing(&self, request: &WithdrawalRequest) -> Result<(), WithdrawalError> {
        if self
            .withdrawals
            .update_if_status(request, WithdrawalStatus::Processing)
            .await?
        {
            return Ok(());
        }
        // Rejected (and refunded) while the payout was in flight.
        tracing::error!(
            alert = "reconciliation",
            withdrawal_id = %request.id,
            payout_id = ?request.payout_id,
            "Withdrawal changed while its payout was in flight"
        );
        Err(WithdrawalError::Conflict(format!(
            "withdrawal {} changed while its payout was in flight",
            request.id
        )))
    }

    async fn refund(&self, request: &WithdrawalRequest, reason: &str) -> Result<(), WithdrawalError> {
        tracing::warn!(withdrawal_id = %request.id, reason, "Payout failed, restoring funds");
        self.withdrawals
            .reject_with_refund(&request.id, reason, Timestamp::now())
            .await?;
        Ok(())
    }

    fn unknown_outcome(&self, request: WithdrawalRequest, detail: &str) -> ApproveWithdrawalResult {
        tracing::error!(
            alert = "reconciliation",
            withdrawal_id = %request.id,
            detail,
            "Payout outcome unknown, left processing"
        );
        ApproveWithdrawalResult {
            request,
            outcome: PayoutOutcome::Unknown,
        }
    }
}
