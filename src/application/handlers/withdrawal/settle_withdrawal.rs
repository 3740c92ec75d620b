//! SettleWithdrawalHandler - Command handler for confirming an in-flight payout.
//!
//! Used when the provider completes a queued payout, or when an operator
//! reconciles one whose approval timed out.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, WithdrawalId};
use crate::domain::withdrawal::{WithdrawalError, WithdrawalRequest, WithdrawalStatus};
use crate::ports::WithdrawalRepository;

#[derive(Debug, Clone)]
pub struct SettleWithdrawalCommand {
    pub withdrawal_id: WithdrawalId,
    pub utr: Option<String>,
    /// Provider payout id, when the approval never learned it.
    pub payout_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SettleWithdrawalResult {
    pub request: WithdrawalRequest,
}

pub struct SettleWithdrawalHandler {
    withdrawals: Arc<dyn WithdrawalRepository>,
}

impl SettleWithdrawalHandler {
    pub fn new(withdrawals: Arc<dyn WithdrawalRepository>) -> Self {
        Self { withdrawals }
    }

    pub async fn handle(
        &self,
        cmd: SettleWithdrawalCommand,
    ) -> Result<SettleWithdrawalResult, WithdrawalError> {
        let mut request = self
            .withdrawals
            .find_by_id(&cmd.withdrawal_id)
            .await?
            .ok_or(WithdrawalError::NotFound(cmd.withdrawal_id))?;
        if request.status != WithdrawalStatus::Processing {
            return Err(WithdrawalError::invalid_state(request.status.as_str(), "settle"));
        }

        let now = Timestamp::now();
        let utr = cmd.utr.filter(|u| !u.trim().is_empty());
        if let Some(payout_id) = cmd.payout_id.filter(|p| !p.trim().is_empty()) {
            request.record_payout(payout_id, None, now);
        }
        request
            .mark_paid(utr, now)
            .map_err(|_| WithdrawalError::invalid_state(request.status.as_str(), "settle"))?;

        if !self
            .withdrawals
            .update_if_status(&request, WithdrawalStatus::Processing)
            .await?
        {
            return Err(WithdrawalError::Conflict(format!(
                "withdrawal {} changed during settlement",
                request.id
            )));
        }

        tracing::info!(withdrawal_id = %request.id, utr = ?request.utr, "Withdrawal settled");
        Ok(SettleWithdrawalResult { request })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::domain::foundation::{Money, UserId};
    use crate::domain::withdrawal::{PayoutDetails, PayoutMethod, WithdrawalSource};

    async fn stored(world: &World, status: WithdrawalStatus) -> WithdrawalRequest {
        let owner = UserId::new();
        world.fund_earnings(owner, 50_000).await;
        let mut request = WithdrawalRequest::new(
            owner,
            WithdrawalSource::Earnings,
            Money::from_minor(20_000),
            PayoutMethod::Upi,
            PayoutDetails {
                upi_id: Some("owner@okbank".to_string()),
                ..Default::default()
            },
            Timestamp::now(),
        );
        world.store.create_reserving(&request).await.unwrap();
        if status == WithdrawalStatus::Processing {
            let now = Timestamp::now();
            request.approve(now).unwrap();
            request.start_processing(now).unwrap();
            request.record_payout("pout_queued", None, now);
            assert!(world
                .store
                .update_if_status(&request, WithdrawalStatus::Requested)
                .await
                .unwrap());
        }
        request
    }

    #[tokio::test]
    async fn processing_request_becomes_paid_with_utr() {
        let world = World::new();
        let request = stored(&world, WithdrawalStatus::Processing).await;

        let result = SettleWithdrawalHandler::new(world.store.clone())
            .handle(SettleWithdrawalCommand {
                withdrawal_id: request.id,
                utr: Some("UTR777".to_string()),
                payout_id: None,
            })
            .await
            .unwrap();

        assert_eq!(result.request.status, WithdrawalStatus::Paid);
        assert_eq!(result.request.utr.as_deref(), Some("UTR777"));
        assert_eq!(result.request.payout_id.as_deref(), Some("pout_queued"));
    }

    #[tokio::test]
    async fn requested_cannot_be_settled() {
        let world = World::new();
        let request = stored(&world, WithdrawalStatus::Requested).await;

        let err = SettleWithdrawalHandler::new(world.store.clone())
            .handle(SettleWithdrawalCommand {
                withdrawal_id: request.id,
                utr: None,
                payout_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, WithdrawalError::invalid_state("requested", "settle"));
    }
}
