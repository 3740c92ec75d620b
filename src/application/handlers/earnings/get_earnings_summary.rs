//! GetEarningsSummaryHandler - Query handler for an owner's earnings overview.
//!
//! Reading the summary is what matures held earnings: due sales are moved from
//! pending to withdrawable before the balances are read.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{DomainError, Money, Percentage, Timestamp, UserId};
use crate::ports::{
    EarningsLedger, GroupRepository, PlatformSettingsSource, WithdrawalRepository,
    MATURATION_BATCH_LIMIT,
};

#[derive(Debug, Clone)]
pub struct GetEarningsSummaryQuery {
    pub owner_id: UserId,
    /// Maturation cut-off; defaults to now.
    pub as_of: Option<Timestamp>,
}

/// Earnings overview for one owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EarningsSummary {
    pub withdrawable_balance: Money,
    pub pending_balance: Money,
    pub total_earned: Money,
    /// Amount matured by this read.
    pub matured_now: Money,
    pub owned_groups: u32,
    /// Sum of requests still holding reserved funds.
    pub pending_withdrawals: Money,
    pub min_withdrawal: Money,
    pub wallet_withdrawals_enabled: bool,
    pub earnings_withdrawals_enabled: bool,
    pub platform_cut_percent: Percentage,
}

pub struct GetEarningsSummaryHandler {
    earnings: Arc<dyn EarningsLedger>,
    groups: Arc<dyn GroupRepository>,
    withdrawals: Arc<dyn WithdrawalRepository>,
    settings: Arc<dyn PlatformSettingsSource>,
}

impl GetEarningsSummaryHandler {
    pub fn new(
        earnings: Arc<dyn EarningsLedger>,
        groups: Arc<dyn GroupRepository>,
        withdrawals: Arc<dyn WithdrawalRepository>,
        settings: Arc<dyn PlatformSettingsSource>,
    ) -> Self {
        Self {
            earnings,
            groups,
            withdrawals,
            settings,
        }
    }

    pub async fn handle(&self, query: GetEarningsSummaryQuery) -> Result<EarningsSummary, DomainError> {
        let now = query.as_of.unwrap_or_else(Timestamp::now);
        let matured = self
            .earnings
            .mature(&query.owner_id, now, MATURATION_BATCH_LIMIT)
            .await?;
        if !matured.is_noop() {
            tracing::info!(
                owner_id = %query.owner_id,
                matured = %matured.matured,
                transactions = matured.transactions,
                "Held earnings matured"
            );
        }

        let account = self.earnings.find(&query.owner_id).await?;
        let owned_groups = self.groups.count_owned(&query.owner_id).await?;
        let pending_withdrawals = self.withdrawals.open_total(&query.owner_id).await?;
        let settings = self.settings.current().await?;

        let (withdrawable_balance, pending_balance, total_earned) = account
            .map(|a| (a.withdrawable_balance, a.pending_balance, a.total_earned))
            .unwrap_or((Money::ZERO, Money::ZERO, Money::ZERO));

        Ok(EarningsSummary {
            withdrawable_balance,
            pending_balance,
            total_earned,
            matured_now: matured.matured,
            owned_groups,
            pending_withdrawals,
            min_withdrawal: settings.min_withdrawal,
            wallet_withdrawals_enabled: settings.wallet_withdrawals_enabled,
            earnings_withdrawals_enabled: settings.earnings_withdrawals_enabled,
            platform_cut_percent: settings.platform_cut_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::application::handlers::join::{FinalizeJoinCommand, FinalizeSource};
    use crate::domain::join::{JoinIntent, PaymentMethod};

    fn handler(world: &World) -> GetEarningsSummaryHandler {
        GetEarningsSummaryHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.settings.clone(),
        )
    }

    fn at(owner_id: UserId, as_of: Timestamp) -> GetEarningsSummaryQuery {
        GetEarningsSummaryQuery {
            owner_id,
            as_of: Some(as_of),
        }
    }

    #[tokio::test]
    async fn held_sale_matures_after_the_window() {
        let world = World::new();
        world.update_settings(|s| s.hold_hours = 24);
        let owner = UserId::new();
        let group = world.group(owner, 200, 4);
        let invite = world.invite(&group, None);
        let start = Timestamp::now();
        let mut intent = JoinIntent::initiate(
            invite.code.clone(),
            group.id,
            UserId::new(),
            group.share_price,
            "INR",
            PaymentMethod::Gateway,
            start,
        );
        intent.mark_paid("pay_hold", start).unwrap();
        world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(intent),
                payment_id: "pay_hold".to_string(),
            })
            .await
            .unwrap();
        let handler = handler(&world);

        let early = handler.handle(at(owner, start.plus_hours(23))).await.unwrap();
        assert_eq!(early.pending_balance, Money::from_minor(180));
        assert_eq!(early.withdrawable_balance, Money::ZERO);
        assert_eq!(early.matured_now, Money::ZERO);

        let late = handler.handle(at(owner, start.plus_hours(25))).await.unwrap();
        assert_eq!(late.pending_balance, Money::ZERO);
        assert_eq!(late.withdrawable_balance, Money::from_minor(180));
        assert_eq!(late.matured_now, Money::from_minor(180));
        assert_eq!(late.total_earned, Money::from_minor(180));

        let again = handler.handle(at(owner, start.plus_hours(26))).await.unwrap();
        assert_eq!(again.withdrawable_balance, Money::from_minor(180));
        assert_eq!(again.matured_now, Money::ZERO);
    }

    #[tokio::test]
    async fn summary_reports_groups_and_settings() {
        let world = World::new();
        let owner = UserId::new();
        world.group(owner, 20_000, 4);
        world.group(owner, 10_000, 2);
        world.fund_earnings(owner, 5_000).await;

        let summary = handler(&world)
            .handle(GetEarningsSummaryQuery {
                owner_id: owner,
                as_of: None,
            })
            .await
            .unwrap();

        assert_eq!(summary.owned_groups, 2);
        assert_eq!(summary.withdrawable_balance, Money::from_minor(5_000));
        assert_eq!(summary.pending_withdrawals, Money::ZERO);
        assert_eq!(summary.min_withdrawal, Money::from_minor(10_000));
        assert_eq!(summary.platform_cut_percent.value(), 10);
        assert!(summary.earnings_withdrawals_enabled);
    }

    #[tokio::test]
    async fn owner_without_sales_sees_zeroes() {
        let world = World::new();
        let summary = handler(&world)
            .handle(GetEarningsSummaryQuery {
                owner_id: UserId::new(),
                as_of: None,
            })
            .await
            .unwrap();
        assert_eq!(summary.total_earned, Money::ZERO);
        assert_eq!(summary.owned_groups, 0);
    }
}
