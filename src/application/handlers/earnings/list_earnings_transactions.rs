//! ListEarningsTransactionsHandler - Query handler for an owner's seat sales.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::ledger::GroupTransaction;
use crate::ports::{GroupTransactionRepository, Page, PageRequest};

#[derive(Debug, Clone)]
pub struct ListEarningsTransactionsQuery {
    pub owner_id: UserId,
    pub page: PageRequest,
}

pub struct ListEarningsTransactionsHandler {
    transactions: Arc<dyn GroupTransactionRepository>,
}

impl ListEarningsTransactionsHandler {
    pub fn new(transactions: Arc<dyn GroupTransactionRepository>) -> Self {
        Self { transactions }
    }

    /// Paid sales owned by the user, newest first.
    pub async fn handle(
        &self,
        query: ListEarningsTransactionsQuery,
    ) -> Result<Page<GroupTransaction>, DomainError> {
        self.transactions
            .list_paid_by_owner(&query.owner_id, query.page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::application::handlers::join::{
        InitiateDirectPurchaseCommand, InitiateDirectPurchaseHandler,
    };
    use crate::domain::foundation::Money;

    #[tokio::test]
    async fn lists_only_paid_sales_of_the_owner() {
        let world = World::new();
        world.gateway.set_orders_enabled(false);
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let purchase = InitiateDirectPurchaseHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.gateway_port(),
            world.settings.clone(),
            world.finalizer(),
        );
        for _ in 0..3 {
            purchase
                .handle(InitiateDirectPurchaseCommand {
                    group_id: group.id,
                    buyer_id: UserId::new(),
                })
                .await
                .unwrap();
        }
        world.group(UserId::new(), 5_000, 2);

        let page = ListEarningsTransactionsHandler::new(world.store.clone())
            .handle(ListEarningsTransactionsQuery {
                owner_id: owner,
                page: PageRequest::new(1, 2),
            })
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert!(page.items.iter().all(|t| t.net == Money::from_minor(18_000)));
    }
}
