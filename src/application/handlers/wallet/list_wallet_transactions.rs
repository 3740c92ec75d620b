//! ListWalletTransactionsHandler - Query handler for a user's wallet history.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::domain::ledger::{WalletError, WalletTransaction, WalletTransactionFilter};
use crate::ports::{Page, WalletLedger};

#[derive(Debug, Clone)]
pub struct ListWalletTransactionsQuery {
    pub user_id: UserId,
    pub filter: WalletTransactionFilter,
}

pub struct ListWalletTransactionsHandler {
    wallet: Arc<dyn WalletLedger>,
}

impl ListWalletTransactionsHandler {
    pub fn new(wallet: Arc<dyn WalletLedger>) -> Self {
        Self { wallet }
    }

    pub async fn handle(
        &self,
        query: ListWalletTransactionsQuery,
    ) -> Result<Page<WalletTransaction>, WalletError> {
        if let (Some(from), Some(to)) = (query.filter.from, query.filter.to) {
            if from.is_after(&to) {
                return Ok(Page::empty());
            }
        }
        Ok(self.wallet.transactions(&query.user_id, &query.filter).await?)
    }
}
