use async_trait::async_trait;

use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{DomainError, Money, Timestamp, UserId};
use crate::domain::ledger::{EarningsAccount, MaturationOutcome, TransactionStatus};
use crate::ports::EarningsLedger;

use super::InMemoryStore;

#[async_trait]
impl EarningsLedger for InMemoryStore {
    async fn find(&self, owner_id: &UserId) -> Result<Option<EarningsAccount>, DomainError> {
        Ok(self.lock().earnings.get(owner_id).cloned())
    }

    async fn credit(
        &self,
        owner_id: &UserId,
        bucket: EarningsBucket,
        net: Money,
        now: Timestamp,
    ) -> Result<EarningsAccount, DomainError> {
        let mut state = self.lock();
        let account = state
            .earnings
            .entry(*owner_id)
            .or_insert_with(|| EarningsAccount::empty(*owner_id, now));
        account.credit(bucket, net, now);
        Ok(account.clone())
    }

    async fn mature(
        &self,
        owner_id: &UserId,
        now: Timestamp,
        limit: usize,
    ) -> Result<MaturationOutcome, DomainError> {
        let mut state = self.lock();
        let mut due: Vec<_> = state
            .transactions
            .values()
            .filter(|t| t.owner_id == *owner_id && t.status == TransactionStatus::Paid && t.is_due(&now))
            .map(|t| (t.pending_release_at, t.id))
            .collect();
        if due.is_empty() {
            return Ok(MaturationOutcome::default());
        }
        due.sort();
        due.truncate(limit);

        let mut sum = Money::ZERO;
        for (_, id) in &due {
            if let Some(tx) = state.transactions.get_mut(id) {
                sum = sum + tx.net;
                tx.pending_release_at = None;
                tx.updated_at = now;
            }
        }

        let account = state
            .earnings
            .entry(*owner_id)
            .or_insert_with(|| EarningsAccount::empty(*owner_id, now));
        let matured = account.mature(sum, now);
        if matured != sum {
            tracing::error!(
                alert = "reconciliation",
                owner_id = %owner_id,
                due = %sum,
                matured = %matured,
                "Pending earnings smaller than matured transactions"
            );
        }

        Ok(MaturationOutcome {
            matured,
            transactions: due.len(),
        })
    }
}
