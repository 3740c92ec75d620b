//! ListWithdrawalsHandler - Query handler for withdrawal requests.
//!
//! Owners see their own requests; operators list across owners with status
//! and source filters.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::withdrawal::{
    WithdrawalError, WithdrawalFilter, WithdrawalRequest, WithdrawalSource, WithdrawalStatus,
};
use crate::ports::WithdrawalRepository;

#[derive(Debug, Clone)]
pub enum ListWithdrawalsQuery {
    /// The caller's own requests.
    Mine { owner_id: UserId },
    /// Operator view.
    All {
        status: Option<WithdrawalStatus>,
        source: Option<WithdrawalSource>,
    },
}

impl ListWithdrawalsQuery {
    fn filter(&self) -> WithdrawalFilter {
        match self {
            ListWithdrawalsQuery::Mine { owner_id } => WithdrawalFilter::for_owner(*owner_id),
            ListWithdrawalsQuery::All { status, source } => WithdrawalFilter {
                owner_id: None,
                status: *status,
                source: *source,
            },
        }
    }
}

pub struct ListWithdrawalsHandler {
    withdrawals: Arc<dyn WithdrawalRepository>,
}

impl ListWithdrawalsHandler {
    pub fn new(withdrawals: Arc<dyn WithdrawalRepository>) -> Self {
        Self { withdrawals }
    }

    /// Returns matching requests, newest first.
    pub async fn handle(
        &self,
        query: ListWithdrawalsQuery,
    ) -> Result<Vec<WithdrawalRequest>, WithdrawalError> {
        Ok(self.withdrawals.list(&query.filter()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::domain::foundation::{Money, Timestamp};
    use crate::domain::withdrawal::{PayoutDetails, PayoutMethod};

    async fn seed(world: &World, owner: UserId) -> WithdrawalRequest {
        world.fund_earnings(owner, 50_000).await;
        let request = WithdrawalRequest::new(
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
        request
    }

    #[tokio::test]
    async fn owners_only_see_their_own() {
        let world = World::new();
        let alice = UserId::new();
        let mine = seed(&world, alice).await;
        seed(&world, UserId::new()).await;

        let rows = ListWithdrawalsHandler::new(world.store.clone())
            .handle(ListWithdrawalsQuery::Mine { owner_id: alice })
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, mine.id);
    }

    #[tokio::test]
    async fn operator_filters_by_status_and_source() {
        let world = World::new();
        seed(&world, UserId::new()).await;
        seed(&world, UserId::new()).await;
        let handler = ListWithdrawalsHandler::new(world.store.clone());

        let requested = handler
            .handle(ListWithdrawalsQuery::All {
                status: Some(WithdrawalStatus::Requested),
                source: Some(WithdrawalSource::Earnings),
            })
            .await
            .unwrap();
        let paid = handler
            .handle(ListWithdrawalsQuery::All {
                status: Some(WithdrawalStatus::Paid),
                source: None,
            })
            .await
            .unwrap();

        assert_eq!(requested.len(), 2);
        assert!(paid.is_empty());
    }
}
