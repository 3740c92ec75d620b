//! GetWalletHandler - Query handler for a user's wallet balance.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{Money, UserId, WalletId};
use crate::domain::ledger::WalletError;
use crate::ports::WalletLedger;

#[derive(Debug, Clone)]
pub struct GetWalletQuery {
    pub user_id: UserId,
}

/// Wallet view. A user who never received funds has a zero balance and no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetWalletResult {
    pub wallet_id: Option<WalletId>,
    pub balance: Money,
}

pub struct GetWalletHandler {
    wallet: Arc<dyn WalletLedger>,
}

impl GetWalletHandler {
    pub fn new(wallet: Arc<dyn WalletLedger>) -> Self {
        Self { wallet }
    }

    pub async fn handle(&self, query: GetWalletQuery) -> Result<GetWalletResult, WalletError> {
        let account = self.wallet.find_account(&query.user_id).await?;
        Ok(GetWalletResult {
            wallet_id: account.as_ref().map(|a| a.id),
            balance: account.map_or(Money::ZERO, |a| a.balance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;

    #[tokio::test]
    async fn unknown_user_has_empty_wallet() {
        let world = World::new();
        let result = GetWalletHandler::new(world.store.clone())
            .handle(GetWalletQuery {
                user_id: UserId::new(),
            })
            .await
            .unwrap();
        assert_eq!(result.balance, Money::ZERO);
        assert!(result.wallet_id.is_none());
    }

    #[tokio::test]
    async fn reports_current_balance() {
        let world = World::new();
        let user = UserId::new();
        world.fund_wallet(user, 2_500).await;

        let result = GetWalletHandler::new(world.store.clone())
            .handle(GetWalletQuery { user_id: user })
            .await
            .unwrap();
        assert_eq!(result.balance, Money::from_minor(2_500));
        assert!(result.wallet_id.is_some());
    }
}
