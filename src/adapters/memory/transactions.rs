use async_trait::async_trait;

use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{DomainError, ErrorCode, GroupId, TransactionId, UserId};
use crate::domain::ledger::{EarningsAccount, GroupTransaction, TransactionStatus};
use crate::ports::{
    CommittedSale, GroupTransactionRepository, InviteUse, Page, PageRequest, SaleCommit,
    SaleOutcome, SaleRecord,
};

use super::store::not_found;
use super::InMemoryStore;

#[async_trait]
impl GroupTransactionRepository for InMemoryStore {
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<GroupTransaction>, DomainError> {
        Ok(self.lock().transactions.get(id).cloned())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<GroupTransaction>, DomainError> {
        Ok(self
            .lock()
            .transactions
            .values()
            .find(|t| t.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    async fn find_pending_by_order_id(&self, order_id: &str) -> Result<Option<GroupTransaction>, DomainError> {
        Ok(self
            .lock()
            .transactions
            .values()
            .find(|t| t.status == TransactionStatus::Pending && t.order_id.as_deref() == Some(order_id))
            .cloned())
    }

    async fn find_pending_for(
        &self,
        group_id: &GroupId,
        buyer_id: &UserId,
    ) -> Result<Option<GroupTransaction>, DomainError> {
        Ok(self
            .lock()
            .transactions
            .values()
            .find(|t| {
                t.status == TransactionStatus::Pending
                    && t.group_id == *group_id
                    && t.buyer_id == *buyer_id
            })
            .cloned())
    }

    async fn insert_pending(&self, tx: &GroupTransaction) -> Result<(), DomainError> {
        self.lock().transactions.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn commit_sale(&self, commit: &SaleCommit) -> Result<SaleOutcome, DomainError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let now = commit.now;

        // Claim the payment id. Every check runs before the first write.
        if let Some(existing) = state
            .transactions
            .values()
            .find(|t| t.payment_id.as_deref() == Some(commit.payment_id.as_str()))
        {
            return Ok(SaleOutcome::Replayed(existing.clone()));
        }
        let transaction = match &commit.record {
            SaleRecord::New(tx) => tx.clone(),
            SaleRecord::SettlePending {
                id,
                pending_release_at,
            } => {
                let current = state
                    .transactions
                    .get(id)
                    .ok_or_else(|| not_found(ErrorCode::TransactionNotFound, "Transaction", id))?;
                match current.status {
                    TransactionStatus::Pending => {
                        let mut settled = current.clone();
                        settled.settle(commit.payment_id.clone(), *pending_release_at, now)?;
                        settled
                    }
                    TransactionStatus::Paid => return Ok(SaleOutcome::Replayed(current.clone())),
                    TransactionStatus::Refunded => {
                        return Err(DomainError::new(
                            ErrorCode::InvalidStateTransition,
                            "Transaction was refunded",
                        ))
                    }
                }
            }
        };

        let membership = &commit.membership;
        let already_member = state.memberships.iter().any(|m| {
            m.group_id == membership.group_id && m.user_id == membership.user_id && m.is_current()
        });
        let seated = if already_member {
            None
        } else {
            let group = state
                .groups
                .get_mut(&membership.group_id)
                .ok_or_else(|| not_found(ErrorCode::GroupNotFound, "Group", membership.group_id))?;
            let activated = group.record_join(now);
            Some((group.clone(), activated))
        };

        // Apply.
        state.transactions.insert(transaction.id, transaction.clone());
        if seated.is_some() {
            state.memberships.push(membership.clone());
        }

        let earnings = if transaction.net.is_zero() {
            None
        } else {
            let bucket = EarningsBucket::for_release(transaction.pending_release_at);
            let account = state
                .earnings
                .entry(transaction.owner_id)
                .or_insert_with(|| EarningsAccount::empty(transaction.owner_id, now));
            account.credit(bucket, transaction.net, now);
            Some(account.clone())
        };

        let invite_use = match (&seated, commit.invite_id) {
            (Some(_), Some(invite_id)) => match state.invites.get_mut(&invite_id) {
                Some(invite) if invite.has_remaining_uses() => {
                    invite.uses_count += 1;
                    InviteUse::Counted
                }
                Some(_) => InviteUse::OverLimit,
                None => InviteUse::NotCounted,
            },
            _ => InviteUse::NotCounted,
        };

        let (seated, group_activated) = match seated {
            Some((group, activated)) => (Some(group), activated),
            None => (None, false),
        };
        Ok(SaleOutcome::Committed(CommittedSale {
            transaction,
            seated,
            group_activated,
            earnings,
            invite_use,
        }))
    }

    async fn list_paid_by_owner(
        &self,
        owner_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<GroupTransaction>, DomainError> {
        let mut rows: Vec<GroupTransaction> = self
            .lock()
            .transactions
            .values()
            .filter(|t| t.owner_id == *owner_id && t.status == TransactionStatus::Paid)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::slice(rows, page.offset(), page.limit as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fees::FeeSplit;
    use crate::domain::foundation::{Money, Percentage, Timestamp};
    use crate::domain::group::{Group, GroupMembership, GroupStatus, MemberRole};
    use crate::domain::invite::GroupInvite;

    struct Seeded {
        store: InMemoryStore,
        group: Group,
        invite: GroupInvite,
    }

    fn seeded(limit: u32, max_uses: Option<u32>) -> Seeded {
        let store = InMemoryStore::new();
        let now = Timestamp::now();
        let group = Group::new("Music family", UserId::new(), Money::from_minor(200), limit, now).unwrap();
        store.seed_group(group.clone(), group.created_by);
        let invite = GroupInvite::issue(group.id, group.created_by, MemberRole::Owner, max_uses, None, now);
        store.seed_invite(invite.clone());
        Seeded { store, group, invite }
    }

    fn split() -> FeeSplit {
        FeeSplit::compute(Money::from_minor(200), Percentage::try_new(10).unwrap())
    }

    fn sale(s: &Seeded, buyer: UserId, payment_id: &str) -> SaleCommit {
        let now = Timestamp::now();
        SaleCommit {
            payment_id: payment_id.to_string(),
            record: SaleRecord::New(GroupTransaction::paid(
                s.group.id,
                s.group.created_by,
                buyer,
                split(),
                None,
                payment_id.to_string(),
                None,
                now,
            )),
            membership: GroupMembership::member(s.group.id, buyer, now),
            invite_id: Some(s.invite.id),
            now,
        }
    }

    #[tokio::test]
    async fn commit_writes_every_effect_together() {
        let s = seeded(4, Some(2));
        let buyer = UserId::new();

        let outcome = s.store.commit_sale(&sale(&s, buyer, "pay_1")).await.unwrap();

        let SaleOutcome::Committed(committed) = outcome else {
            panic!("expected a fresh sale");
        };
        assert!(committed.membership_created());
        assert_eq!(committed.invite_use, InviteUse::Counted);
        assert_eq!(committed.earnings.unwrap().withdrawable_balance, Money::from_minor(180));
        assert_eq!(s.store.group(&s.group.id).unwrap().member_count, 1);
        assert_eq!(s.store.invite(&s.invite.id).unwrap().uses_count, 1);
        assert_eq!(s.store.members_of(&s.group.id).len(), 2);
    }

    #[tokio::test]
    async fn recorded_payment_is_replayed_without_writes() {
        let s = seeded(4, None);
        let buyer = UserId::new();
        let first = s.store.commit_sale(&sale(&s, buyer, "pay_1")).await.unwrap();

        let second = s.store.commit_sale(&sale(&s, buyer, "pay_1")).await.unwrap();

        assert!(second.is_replay());
        assert_eq!(second.transaction().id, first.transaction().id);
        assert_eq!(s.store.all_transactions().len(), 1);
        assert_eq!(s.store.group(&s.group.id).unwrap().member_count, 1);
        assert_eq!(s.store.invite(&s.invite.id).unwrap().uses_count, 1);
        assert_eq!(
            s.store.earnings_of(&s.group.created_by).unwrap().total_earned,
            Money::from_minor(180)
        );
    }

    #[tokio::test]
    async fn existing_member_is_not_seated_or_counted_again() {
        let s = seeded(4, None);
        let buyer = UserId::new();
        s.store.commit_sale(&sale(&s, buyer, "pay_1")).await.unwrap();

        let outcome = s.store.commit_sale(&sale(&s, buyer, "pay_2")).await.unwrap();

        let SaleOutcome::Committed(committed) = outcome else {
            panic!("a new payment id records a new sale");
        };
        assert!(!committed.membership_created());
        assert_eq!(committed.invite_use, InviteUse::NotCounted);
        assert_eq!(s.store.group(&s.group.id).unwrap().member_count, 1);
        assert_eq!(s.store.invite(&s.invite.id).unwrap().uses_count, 1);
    }

    #[tokio::test]
    async fn invite_at_limit_is_left_alone() {
        let s = seeded(4, Some(1));
        s.store.commit_sale(&sale(&s, UserId::new(), "pay_1")).await.unwrap();

        let outcome = s.store.commit_sale(&sale(&s, UserId::new(), "pay_2")).await.unwrap();

        let SaleOutcome::Committed(committed) = outcome else {
            panic!("expected a fresh sale");
        };
        assert_eq!(committed.invite_use, InviteUse::OverLimit);
        assert_eq!(s.store.invite(&s.invite.id).unwrap().uses_count, 1);
    }

    #[tokio::test]
    async fn last_seat_activates_group() {
        let s = seeded(1, None);

        let outcome = s.store.commit_sale(&sale(&s, UserId::new(), "pay_1")).await.unwrap();

        let SaleOutcome::Committed(committed) = outcome else {
            panic!("expected a fresh sale");
        };
        assert!(committed.group_activated);
        assert_eq!(committed.seated.unwrap().status, GroupStatus::Active);
    }

    #[tokio::test]
    async fn missing_group_writes_nothing() {
        let s = seeded(4, None);
        let mut commit = sale(&s, UserId::new(), "pay_1");
        commit.membership = GroupMembership::member(GroupId::new(), UserId::new(), Timestamp::now());

        let err = s.store.commit_sale(&commit).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::GroupNotFound);
        assert!(s.store.all_transactions().is_empty());
        assert!(s.store.earnings_of(&s.group.created_by).is_none());
        assert_eq!(s.store.invite(&s.invite.id).unwrap().uses_count, 0);
    }

    #[tokio::test]
    async fn pending_purchase_settles_once() {
        let s = seeded(4, None);
        let buyer = UserId::new();
        let pending = GroupTransaction::pending(
            s.group.id,
            s.group.created_by,
            buyer,
            split(),
            Some("order_1".to_string()),
            Timestamp::now(),
        );
        s.store.insert_pending(&pending).await.unwrap();
        let settle = |payment_id: &str| SaleCommit {
            payment_id: payment_id.to_string(),
            record: SaleRecord::SettlePending {
                id: pending.id,
                pending_release_at: None,
            },
            membership: GroupMembership::member(s.group.id, buyer, Timestamp::now()),
            invite_id: None,
            now: Timestamp::now(),
        };

        let first = s.store.commit_sale(&settle("pay_1")).await.unwrap();
        let second = s.store.commit_sale(&settle("pay_1")).await.unwrap();

        assert!(!first.is_replay());
        assert!(second.is_replay());
        assert_eq!(first.transaction().status, TransactionStatus::Paid);
        assert!(s.store.find_pending_by_order_id("order_1").await.unwrap().is_none());
        assert_eq!(
            s.store.earnings_of(&s.group.created_by).unwrap().withdrawable_balance,
            Money::from_minor(180)
        );
    }
}
