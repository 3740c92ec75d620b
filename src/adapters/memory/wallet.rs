use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, Timestamp, UserId};
use crate::domain::ledger::{
    Direction, WalletAccount, WalletEntry, WalletMutation, WalletTransaction,
    WalletTransactionFilter,
};
use crate::ports::{Page, WalletLedger};

use super::InMemoryStore;

#[async_trait]
impl WalletLedger for InMemoryStore {
    async fn find_account(&self, owner_id: &UserId) -> Result<Option<WalletAccount>, DomainError> {
        Ok(self.lock().wallets.get(owner_id).cloned())
    }

    async fn credit(
        &self,
        owner_id: &UserId,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError> {
        self.lock()
            .apply_wallet(owner_id, Direction::Credit, amount, entry, Timestamp::now())
    }

    async fn debit(
        &self,
        owner_id: &UserId,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError> {
        self.lock()
            .apply_wallet(owner_id, Direction::Debit, amount, entry, Timestamp::now())
    }

    async fn transactions(
        &self,
        owner_id: &UserId,
        filter: &WalletTransactionFilter,
    ) -> Result<Page<WalletTransaction>, DomainError> {
        let state = self.lock();
        let Some(wallet) = state.wallets.get(owner_id) else {
            return Ok(Page::empty());
        };
        let mut rows: Vec<WalletTransaction> = state
            .wallet_log
            .iter()
            .filter(|t| t.wallet_id == wallet.id && filter.matches(t))
            .cloned()
            .collect();
        rows.reverse();
        Ok(Page::slice(rows, filter.offset(), filter.limit() as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;
    use crate::domain::ledger::WalletSource;
    use std::sync::Arc;

    fn topup() -> WalletEntry {
        WalletEntry::new(WalletSource::Topup, "Top-up")
    }

    #[tokio::test]
    async fn credit_opens_wallet_and_logs_once() {
        let store = InMemoryStore::new();
        let user = UserId::new();

        let m = store.credit(&user, Money::from_minor(500), topup()).await.unwrap();

        assert_eq!(m.transaction().balance_after, Money::from_minor(500));
        assert_eq!(store.wallet_balance(&user), Money::from_minor(500));
        assert_eq!(store.wallet_log_len(&user), 1);
    }

    #[tokio::test]
    async fn debit_beyond_balance_writes_nothing() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        store.credit(&user, Money::from_minor(100), topup()).await.unwrap();

        let err = store
            .debit(&user, Money::from_minor(101), WalletEntry::new(WalletSource::Purchase, "Seat"))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert_eq!(store.wallet_balance(&user), Money::from_minor(100));
        assert_eq!(store.wallet_log_len(&user), 1);
    }

    #[tokio::test]
    async fn idempotency_key_replays_original() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        store.credit(&user, Money::from_minor(500), topup()).await.unwrap();
        let entry = WalletEntry::new(WalletSource::Purchase, "Seat").with_idempotency_key("join:1");

        let first = store.debit(&user, Money::from_minor(200), entry.clone()).await.unwrap();
        let second = store.debit(&user, Money::from_minor(200), entry).await.unwrap();

        assert!(!first.is_replay());
        assert!(second.is_replay());
        assert_eq!(first.transaction().id, second.transaction().id);
        assert_eq!(store.wallet_balance(&user), Money::from_minor(300));
    }

    #[tokio::test]
    async fn concurrent_debits_never_overdraw() {
        let store = Arc::new(InMemoryStore::new());
        let user = UserId::new();
        store.credit(&user, Money::from_minor(500), topup()).await.unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .debit(&user, Money::from_minor(400), WalletEntry::new(WalletSource::Purchase, "A"))
                    .await
            })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .debit(&user, Money::from_minor(400), WalletEntry::new(WalletSource::Purchase, "B"))
                    .await
            })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(store.wallet_balance(&user), Money::from_minor(100));
        assert_eq!(store.wallet_log_len(&user), 2);
    }

    #[tokio::test]
    async fn transactions_are_newest_first_and_filtered() {
        let store = InMemoryStore::new();
        let user = UserId::new();
        store.credit(&user, Money::from_minor(500), topup()).await.unwrap();
        store
            .debit(&user, Money::from_minor(50), WalletEntry::new(WalletSource::Purchase, "Seat"))
            .await
            .unwrap();

        let all = store.transactions(&user, &WalletTransactionFilter::default()).await.unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.items[0].direction, Direction::Debit);

        let credits = store
            .transactions(
                &user,
                &WalletTransactionFilter {
                    direction: Some(Direction::Credit),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(credits.total, 1);
    }
}
