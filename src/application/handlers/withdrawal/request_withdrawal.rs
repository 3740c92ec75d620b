//! RequestWithdrawalHandler - Command handler for an owner's withdrawal request.
//!
//! The amount is reserved from the source balance in the same store operation
//! that inserts the request, so two racing requests cannot both succeed
//! against one balance.

use std::sync::Arc;

use crate::domain::foundation::{Money, Timestamp, UserId};
use crate::domain::withdrawal::{
    PayoutDetails, PayoutMethod, WithdrawalError, WithdrawalRequest, WithdrawalSource,
};
use crate::ports::{PlatformSettingsSource, WithdrawalRepository};

/// Command to request a withdrawal.
#[derive(Debug, Clone)]
pub struct RequestWithdrawalCommand {
    pub owner_id: UserId,
    pub source: WithdrawalSource,
    pub amount: Money,
    pub payout_method: PayoutMethod,
    pub payout_details: PayoutDetails,
}

#[derive(Debug, Clone)]
pub struct RequestWithdrawalResult {
    pub request: WithdrawalRequest,
}

/// Handler for withdrawal requests.
pub struct RequestWithdrawalHandler {
    withdrawals: Arc<dyn WithdrawalRepository>,
    settings: Arc<dyn PlatformSettingsSource>,
}

impl RequestWithdrawalHandler {
    pub fn new(
        withdrawals: Arc<dyn WithdrawalRepository>,
        settings: Arc<dyn PlatformSettingsSource>,
    ) -> Self {
        Self {
            withdrawals,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: RequestWithdrawalCommand,
    ) -> Result<RequestWithdrawalResult, WithdrawalError> {
        let settings = self.settings.current().await?;
        if !settings.withdrawals_enabled(cmd.source) {
            return Err(WithdrawalError::Disabled(cmd.source));
        }
        if cmd.amount.is_zero() || cmd.amount.is_negative() || cmd.amount < settings.min_withdrawal {
            return Err(WithdrawalError::BelowMinimum {
                minimum: settings.min_withdrawal,
                requested: cmd.amount,
            });
        }
        cmd.payout_details.destination(cmd.payout_method)?;

        let request = WithdrawalRequest::new(
            cmd.owner_id,
            cmd.source,
            cmd.amount,
            cmd.payout_method,
            cmd.payout_details,
            Timestamp::now(),
        );
        self.withdrawals.create_reserving(&request).await?;

        tracing::info!(
            withdrawal_id = %request.id,
            owner_id = %request.owner_id,
            source = %request.source,
            amount = %request.amount,
            "Withdrawal requested"
        );
        Ok(RequestWithdrawalResult { request })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::domain::withdrawal::WithdrawalStatus;

    fn handler(world: &World) -> RequestWithdrawalHandler {
        RequestWithdrawalHandler::new(world.store.clone(), world.settings.clone())
    }

    fn upi() -> PayoutDetails {
        PayoutDetails {
            upi_id: Some("owner@okbank".to_string()),
            ..Default::default()
        }
    }

    fn cmd(owner_id: UserId, source: WithdrawalSource, minor: i64) -> RequestWithdrawalCommand {
        RequestWithdrawalCommand {
            owner_id,
            source,
            amount: Money::from_minor(minor),
            payout_method: PayoutMethod::Upi,
            payout_details: upi(),
        }
    }

    #[tokio::test]
    async fn reserves_earnings_on_request() {
        let world = World::new();
        let owner = UserId::new();
        world.fund_earnings(owner, 50_000).await;

        let result = handler(&world)
            .handle(cmd(owner, WithdrawalSource::Earnings, 30_000))
            .await
            .unwrap();

        assert_eq!(result.request.status, WithdrawalStatus::Requested);
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(20_000)
        );
    }

    #[tokio::test]
    async fn wallet_source_debits_the_wallet() {
        let world = World::new();
        world.update_settings(|s| s.wallet_withdrawals_enabled = true);
        let owner = UserId::new();
        world.fund_wallet(owner, 40_000).await;

        handler(&world)
            .handle(cmd(owner, WithdrawalSource::Wallet, 15_000))
            .await
            .unwrap();

        assert_eq!(world.store.wallet_balance(&owner), Money::from_minor(25_000));
        assert_eq!(world.store.wallet_log_len(&owner), 2);
    }

    #[tokio::test]
    async fn disabled_source_is_refused() {
        let world = World::new();
        let owner = UserId::new();
        world.fund_wallet(owner, 40_000).await;

        let err = handler(&world)
            .handle(cmd(owner, WithdrawalSource::Wallet, 15_000))
            .await
            .unwrap_err();
        assert_eq!(err, WithdrawalError::Disabled(WithdrawalSource::Wallet));
    }

    #[tokio::test]
    async fn below_minimum_is_refused() {
        let world = World::new();
        let owner = UserId::new();
        world.fund_earnings(owner, 50_000).await;

        let err = handler(&world)
            .handle(cmd(owner, WithdrawalSource::Earnings, 9_999))
            .await
            .unwrap_err();
        assert!(matches!(err, WithdrawalError::BelowMinimum { .. }));
    }

    #[tokio::test]
    async fn missing_bank_fields_are_refused() {
        let world = World::new();
        let owner = UserId::new();
        world.fund_earnings(owner, 50_000).await;

        let err = handler(&world)
            .handle(RequestWithdrawalCommand {
                payout_method: PayoutMethod::Bank,
                payout_details: PayoutDetails {
                    account_number: Some("1234567890".to_string()),
                    ..Default::default()
                },
                ..cmd(owner, WithdrawalSource::Earnings, 20_000)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WithdrawalError::InvalidPayoutDetails { .. }));
    }

    #[tokio::test]
    async fn insufficient_balance_writes_nothing() {
        let world = World::new();
        let owner = UserId::new();
        world.fund_earnings(owner, 15_000).await;

        let err = handler(&world)
            .handle(cmd(owner, WithdrawalSource::Earnings, 20_000))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            WithdrawalError::InsufficientFunds {
                available: Money::from_minor(15_000),
                requested: Money::from_minor(20_000),
            }
        );
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(15_000)
        );
    }

    #[tokio::test]
    async fn second_open_request_is_a_duplicate() {
        let world = World::new();
        let owner = UserId::new();
        world.fund_earnings(owner, 50_000).await;
        let handler = handler(&world);

        handler
            .handle(cmd(owner, WithdrawalSource::Earnings, 10_000))
            .await
            .unwrap();
        let err = handler
            .handle(cmd(owner, WithdrawalSource::Earnings, 10_000))
            .await
            .unwrap_err();
        assert_eq!(err, WithdrawalError::DuplicateRequest);
    }
}
