use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp, UserId, WithdrawalId};
use crate::domain::ledger::{insufficient_funds, Direction, EarningsAccount, WalletEntry, WalletSource};
use crate::domain::withdrawal::{
    WithdrawalFilter, WithdrawalRequest, WithdrawalSource, WithdrawalStatus,
};
use crate::ports::WithdrawalRepository;

use super::store::not_found;
use super::InMemoryStore;

#[async_trait]
impl WithdrawalRepository for InMemoryStore {
    async fn find_by_id(&self, id: &WithdrawalId) -> Result<Option<WithdrawalRequest>, DomainError> {
        Ok(self.lock().withdrawals.get(id).cloned())
    }

    async fn list(&self, filter: &WithdrawalFilter) -> Result<Vec<WithdrawalRequest>, DomainError> {
        let mut rows: Vec<WithdrawalRequest> = self
            .lock()
            .withdrawals
            .values()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn open_total(&self, owner_id: &UserId) -> Result<Money, DomainError> {
        Ok(self
            .lock()
            .withdrawals
            .values()
            .filter(|w| w.owner_id == *owner_id && w.is_open())
            .map(|w| w.amount)
            .sum())
    }

    async fn create_reserving(&self, request: &WithdrawalRequest) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state
            .withdrawals
            .values()
            .any(|w| w.owner_id == request.owner_id && w.source == request.source && w.is_open())
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateRequest,
                "An open withdrawal request already exists",
            ));
        }

        match request.source {
            WithdrawalSource::Wallet => {
                let entry = WalletEntry::new(WalletSource::Withdrawal, "Withdrawal request")
                    .with_reference(request.id.to_string())
                    .with_idempotency_key(format!("withdrawal:{}", request.id));
                state.apply_wallet(
                    &request.owner_id,
                    Direction::Debit,
                    request.amount,
                    entry,
                    request.created_at,
                )?;
            }
            WithdrawalSource::Earnings => {
                let shortfall = match state.earnings.get_mut(&request.owner_id) {
                    Some(account) => {
                        if account.reserve(request.amount, request.created_at) {
                            None
                        } else {
                            Some(account.withdrawable_balance)
                        }
                    }
                    None => Some(Money::ZERO),
                };
                if let Some(available) = shortfall {
                    return Err(insufficient_funds(available, request.amount));
                }
            }
        }

        state.withdrawals.insert(request.id, request.clone());
        Ok(())
    }

    async fn update_if_status(
        &self,
        request: &WithdrawalRequest,
        expected: WithdrawalStatus,
    ) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let stored = state
            .withdrawals
            .get_mut(&request.id)
            .ok_or_else(|| not_found(ErrorCode::WithdrawalNotFound, "Withdrawal request", request.id))?;
        if stored.status != expected {
            return Ok(false);
        }
        *stored = request.clone();
        Ok(true)
    }

    async fn reject_with_refund(
        &self,
        id: &WithdrawalId,
        reason: &str,
        now: Timestamp,
    ) -> Result<WithdrawalRequest, DomainError> {
        let mut state = self.lock();
        let mut request = state
            .withdrawals
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(ErrorCode::WithdrawalNotFound, "Withdrawal request", id))?;
        if let Err(e) = request.reject(reason, now) {
            return Err(DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("current", request.status.as_str()));
        }

        match request.source {
            WithdrawalSource::Wallet => {
                let entry = WalletEntry::new(WalletSource::Refund, "Withdrawal refund")
                    .with_reference(id.to_string())
                    .with_idempotency_key(format!("withdrawal-refund:{}", id));
                state.apply_wallet(&request.owner_id, Direction::Credit, request.amount, entry, now)?;
            }
            WithdrawalSource::Earnings => {
                state
                    .earnings
                    .entry(request.owner_id)
                    .or_insert_with(|| EarningsAccount::empty(request.owner_id, now))
                    .restore(request.amount, now);
            }
        }

        state.withdrawals.insert(request.id, request.clone());
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fees::EarningsBucket;
    use crate::domain::withdrawal::{PayoutDetails, PayoutMethod};
    use crate::ports::{EarningsLedger, WalletLedger};

    fn request(owner: UserId, source: WithdrawalSource, amount: i64) -> WithdrawalRequest {
        WithdrawalRequest::new(
            owner,
            source,
            Money::from_minor(amount),
            PayoutMethod::Upi,
            PayoutDetails {
                upi_id: Some("owner@okbank".to_string()),
                ..Default::default()
            },
            Timestamp::now(),
        )
    }

    async fn earnings(store: &InMemoryStore, owner: UserId, amount: i64) {
        EarningsLedger::credit(store, &owner, EarningsBucket::Withdrawable, Money::from_minor(amount), Timestamp::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reserve_and_reject_restores_exactly() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        earnings(&store, owner, 50_000).await;
        let r = request(owner, WithdrawalSource::Earnings, 30_000);

        store.create_reserving(&r).await.unwrap();
        assert_eq!(store.earnings_of(&owner).unwrap().withdrawable_balance, Money::from_minor(20_000));

        let rejected = store.reject_with_refund(&r.id, "Rejected by admin", Timestamp::now()).await.unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(store.earnings_of(&owner).unwrap().withdrawable_balance, Money::from_minor(50_000));
    }

    #[tokio::test]
    async fn second_open_request_is_a_duplicate() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        earnings(&store, owner, 50_000).await;
        store.create_reserving(&request(owner, WithdrawalSource::Earnings, 10_000)).await.unwrap();

        let err = store
            .create_reserving(&request(owner, WithdrawalSource::Earnings, 10_000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateRequest);
        assert_eq!(store.earnings_of(&owner).unwrap().withdrawable_balance, Money::from_minor(40_000));
    }

    #[tokio::test]
    async fn short_balance_writes_nothing() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        earnings(&store, owner, 5_000).await;

        let err = store
            .create_reserving(&request(owner, WithdrawalSource::Earnings, 10_000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert!(store.list(&WithdrawalFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wallet_withdrawal_debits_and_refund_credits() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        WalletLedger::credit(&store, &owner, Money::from_minor(20_000), WalletEntry::new(WalletSource::Topup, "Top-up"))
            .await
            .unwrap();
        let r = request(owner, WithdrawalSource::Wallet, 15_000);

        store.create_reserving(&r).await.unwrap();
        assert_eq!(store.wallet_balance(&owner), Money::from_minor(5_000));

        store.reject_with_refund(&r.id, "Payout failed", Timestamp::now()).await.unwrap();
        assert_eq!(store.wallet_balance(&owner), Money::from_minor(20_000));
        assert_eq!(store.wallet_log_len(&owner), 3);
    }

    #[tokio::test]
    async fn paid_request_is_never_refunded() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        earnings(&store, owner, 50_000).await;
        let mut r = request(owner, WithdrawalSource::Earnings, 30_000);
        store.create_reserving(&r).await.unwrap();

        let now = Timestamp::now();
        r.approve(now).unwrap();
        r.start_processing(now).unwrap();
        r.mark_paid(Some("UTR1".to_string()), now).unwrap();
        assert!(store.update_if_status(&r, WithdrawalStatus::Requested).await.unwrap());

        let err = store.reject_with_refund(&r.id, "late", now).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(err.details.get("current").map(String::as_str), Some("paid"));
        assert_eq!(store.earnings_of(&owner).unwrap().withdrawable_balance, Money::from_minor(20_000));
    }

    #[tokio::test]
    async fn update_if_status_refuses_stale_writes() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        earnings(&store, owner, 50_000).await;
        let mut r = request(owner, WithdrawalSource::Earnings, 30_000);
        store.create_reserving(&r).await.unwrap();

        r.approve(Timestamp::now()).unwrap();
        assert!(!store.update_if_status(&r, WithdrawalStatus::Approved).await.unwrap());
        assert!(store.update_if_status(&r, WithdrawalStatus::Requested).await.unwrap());
    }
}
