//! JoinFinalizer - the one path that turns a confirmed payment into a seat.
//!
//! Used by every confirmation source: free and wallet joins, dev
//! confirmations, the gateway webhook and client-side payment verification.
//! Finalization is keyed by the provider payment id. The sale row, the seat,
//! the earnings credit and the invite use are written by one
//! `commit_sale` call, so running it twice for the same payment yields one
//! of each and a failed run leaves none of them behind.

use std::sync::Arc;

use crate::domain::fees::{release_at, FeeSplit};
use crate::domain::foundation::{GroupId, Timestamp, UserId};
use crate::domain::group::{Group, GroupMembership};
use crate::domain::join::{JoinError, JoinIntent};
use crate::domain::ledger::GroupTransaction;
use crate::ports::{
    GroupRepository, GroupTransactionRepository, InviteRepository, InviteUse,
    PlatformSettingsSource, SaleCommit, SaleOutcome, SaleRecord,
};

/// What is being finalized.
#[derive(Debug, Clone)]
pub enum FinalizeSource {
    /// An invite join intent; its amount is split with current settings.
    Intent(JoinIntent),
    /// A pending direct purchase; its recorded split is kept.
    PendingTransaction(GroupTransaction),
}

impl FinalizeSource {
    fn group_id(&self) -> GroupId {
        match self {
            FinalizeSource::Intent(i) => i.group_id,
            FinalizeSource::PendingTransaction(t) => t.group_id,
        }
    }

    fn buyer_id(&self) -> UserId {
        match self {
            FinalizeSource::Intent(i) => i.user_id,
            FinalizeSource::PendingTransaction(t) => t.buyer_id,
        }
    }
}

/// Command to finalize a confirmed payment.
#[derive(Debug, Clone)]
pub struct FinalizeJoinCommand {
    pub source: FinalizeSource,
    pub payment_id: String,
}

/// Result of finalization.
#[derive(Debug, Clone)]
pub struct FinalizeJoinResult {
    pub transaction: GroupTransaction,
    /// True when this payment had already been finalized.
    pub replayed: bool,
    pub membership_created: bool,
    /// True when this join filled the group and activated it.
    pub group_activated: bool,
}

/// Canonical join finalizer.
pub struct JoinFinalizer {
    groups: Arc<dyn GroupRepository>,
    invites: Arc<dyn InviteRepository>,
    transactions: Arc<dyn GroupTransactionRepository>,
    settings: Arc<dyn PlatformSettingsSource>,
}

impl JoinFinalizer {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        invites: Arc<dyn InviteRepository>,
        transactions: Arc<dyn GroupTransactionRepository>,
        settings: Arc<dyn PlatformSettingsSource>,
    ) -> Self {
        Self {
            groups,
            invites,
            transactions,
            settings,
        }
    }

    pub async fn handle(&self, cmd: FinalizeJoinCommand) -> Result<FinalizeJoinResult, JoinError> {
        let FinalizeJoinCommand { source, payment_id } = cmd;

        // 1. Already finalized?
        if let Some(existing) = self.transactions.find_by_payment_id(&payment_id).await? {
            tracing::info!(payment_id = %payment_id, transaction_id = %existing.id, "Payment already finalized");
            return Ok(replayed(existing));
        }

        let group_id = source.group_id();
        let buyer_id = source.buyer_id();
        if self.groups.find_by_id(&group_id).await?.is_none() {
            return Err(JoinError::GroupNotFound(group_id));
        }

        // 2. Owner must exist before anything is written.
        let owner = match self.groups.find_owner(&group_id).await? {
            Some(owner) => owner,
            None => {
                tracing::error!(
                    alert = "reconciliation",
                    group_id = %group_id,
                    payment_id = %payment_id,
                    "Captured payment for a group without an owner"
                );
                return Err(JoinError::NoOwner {
                    group_id: group_id.to_string(),
                });
            }
        };

        // 3. Price the sale.
        let now = Timestamp::now();
        let settings = self.settings.current().await?;
        let record = match &source {
            FinalizeSource::Intent(intent) => {
                let split = FeeSplit::compute(intent.amount, settings.platform_cut_percent);
                let release = hold_until(&split, now, settings.hold_hours);
                SaleRecord::New(GroupTransaction::paid(
                    group_id,
                    owner.user_id,
                    buyer_id,
                    split,
                    intent.order_id.clone(),
                    payment_id.clone(),
                    release,
                    now,
                ))
            }
            FinalizeSource::PendingTransaction(pending) => SaleRecord::SettlePending {
                id: pending.id,
                pending_release_at: hold_until(&pending.split(), now, settings.hold_hours),
            },
        };

        let invite_id = match &source {
            FinalizeSource::Intent(intent) => {
                let invite = self.invites.find_by_code(&intent.invite_code).await?;
                if invite.is_none() {
                    tracing::warn!(invite_code = %intent.invite_code.as_str(), "Invite vanished before its use was recorded");
                }
                invite.map(|i| i.id)
            }
            FinalizeSource::PendingTransaction(_) => None,
        };

        // 4. Claim the payment id; seat, credit and invite use commit with it.
        let commit = SaleCommit {
            payment_id: payment_id.clone(),
            record,
            membership: GroupMembership::member(group_id, buyer_id, now),
            invite_id,
            now,
        };
        let committed = match self.transactions.commit_sale(&commit).await? {
            SaleOutcome::Committed(committed) => committed,
            SaleOutcome::Replayed(existing) => {
                tracing::info!(payment_id = %payment_id, "Lost finalization race, returning recorded sale");
                return Ok(replayed(existing));
            }
        };

        let transaction = &committed.transaction;
        match &committed.seated {
            Some(group) => warn_if_oversold(group, &payment_id),
            None => {
                tracing::debug!(group_id = %group_id, buyer_id = %buyer_id, "Buyer already a member")
            }
        }
        if let Some(account) = &committed.earnings {
            tracing::info!(
                owner_id = %transaction.owner_id,
                gross = %transaction.gross,
                fee = %transaction.fee_amount,
                fee_percent = transaction.fee_percent.value(),
                net = %transaction.net,
                withdrawable = %account.withdrawable_balance,
                pending = %account.pending_balance,
                "Earnings credited"
            );
        }
        if committed.invite_use == InviteUse::OverLimit {
            tracing::error!(
                alert = "reconciliation",
                group_id = %group_id,
                payment_id = %payment_id,
                "Paid join arrived after its invite reached max_uses"
            );
        }

        tracing::info!(
            group_id = %group_id,
            buyer_id = %buyer_id,
            payment_id = %payment_id,
            transaction_id = %transaction.id,
            group_activated = committed.group_activated,
            "Join finalized"
        );

        let membership_created = committed.membership_created();
        Ok(FinalizeJoinResult {
            transaction: committed.transaction,
            replayed: false,
            membership_created,
            group_activated: committed.group_activated,
        })
    }
}

fn replayed(transaction: GroupTransaction) -> FinalizeJoinResult {
    FinalizeJoinResult {
        transaction,
        replayed: true,
        membership_created: false,
        group_activated: false,
    }
}

/// Zero-net sales have nothing to hold.
fn hold_until(split: &FeeSplit, now: Timestamp, hold_hours: u32) -> Option<Timestamp> {
    if split.net.is_zero() {
        None
    } else {
        release_at(now, hold_hours)
    }
}

fn warn_if_oversold(group: &Group, payment_id: &str) {
    if group.member_count > group.share_limit {
        tracing::error!(
            alert = "reconciliation",
            group_id = %group.id,
            member_count = group.member_count,
            share_limit = group.share_limit,
            payment_id = %payment_id,
            "Paid buyer admitted to a full group"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::domain::foundation::{DomainError, ErrorCode, Money, Percentage, TransactionId};
    use crate::domain::group::GroupStatus;
    use crate::domain::invite::GroupInvite;
    use crate::domain::join::PaymentMethod;
    use crate::domain::ledger::TransactionStatus;
    use crate::ports::{Page, PageRequest};

    /// Holds every owner lookup long enough for a second finalizer to get
    /// past the already-finalized check.
    struct SlowOwnerLookup(Arc<dyn GroupRepository>);

    #[async_trait]
    impl GroupRepository for SlowOwnerLookup {
        async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
            self.0.find_by_id(id).await
        }

        async fn save(&self, group: &Group) -> Result<(), DomainError> {
            self.0.save(group).await
        }

        async fn save_membership(&self, membership: &GroupMembership) -> Result<(), DomainError> {
            self.0.save_membership(membership).await
        }

        async fn find_owner(&self, group_id: &GroupId) -> Result<Option<GroupMembership>, DomainError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.0.find_owner(group_id).await
        }

        async fn find_current_membership(
            &self,
            group_id: &GroupId,
            user_id: &UserId,
        ) -> Result<Option<GroupMembership>, DomainError> {
            self.0.find_current_membership(group_id, user_id).await
        }

        async fn count_owned(&self, owner_id: &UserId) -> Result<u32, DomainError> {
            self.0.count_owned(owner_id).await
        }
    }

    /// Fails the first sale commit the way a dropped database connection would.
    struct FirstCommitFails {
        inner: Arc<dyn GroupTransactionRepository>,
        failed: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl GroupTransactionRepository for FirstCommitFails {
        async fn find_by_id(&self, id: &TransactionId) -> Result<Option<GroupTransaction>, DomainError> {
            self.inner.find_by_id(id).await
        }

        async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<GroupTransaction>, DomainError> {
            self.inner.find_by_payment_id(payment_id).await
        }

        async fn find_pending_by_order_id(&self, order_id: &str) -> Result<Option<GroupTransaction>, DomainError> {
            self.inner.find_pending_by_order_id(order_id).await
        }

        async fn find_pending_for(
            &self,
            group_id: &GroupId,
            buyer_id: &UserId,
        ) -> Result<Option<GroupTransaction>, DomainError> {
            self.inner.find_pending_for(group_id, buyer_id).await
        }

        async fn insert_pending(&self, tx: &GroupTransaction) -> Result<(), DomainError> {
            self.inner.insert_pending(tx).await
        }

        async fn commit_sale(&self, commit: &SaleCommit) -> Result<SaleOutcome, DomainError> {
            if !self.failed.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(DomainError::database("connection reset during commit"));
            }
            self.inner.commit_sale(commit).await
        }

        async fn list_paid_by_owner(
            &self,
            owner_id: &UserId,
            page: PageRequest,
        ) -> Result<Page<GroupTransaction>, DomainError> {
            self.inner.list_paid_by_owner(owner_id, page).await
        }
    }

    fn paid_intent(group: &Group, invite: &GroupInvite) -> JoinIntent {
        JoinIntent::initiate(
            invite.code.clone(),
            group.id,
            UserId::new(),
            group.share_price,
            "INR",
            PaymentMethod::Gateway,
            Timestamp::now(),
        )
        .with_order_id("order_1")
    }

    // ════════════════════════════════════════════════════════════════════════
    // Invite intents
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn creates_membership_sale_and_earnings() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let intent = paid_intent(&group, &invite);

        let result = world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(intent.clone()),
                payment_id: "pay_1".to_string(),
            })
            .await
            .unwrap();

        assert!(!result.replayed);
        assert!(result.membership_created);
        assert_eq!(result.transaction.fee_amount, Money::from_minor(2_000));
        assert_eq!(result.transaction.net, Money::from_minor(18_000));
        assert_eq!(result.transaction.owner_id, owner);
        assert_eq!(result.transaction.status, TransactionStatus::Paid);

        let earnings = world.store.earnings_of(&owner).unwrap();
        assert_eq!(earnings.withdrawable_balance, Money::from_minor(18_000));
        assert_eq!(earnings.total_earned, Money::from_minor(18_000));
        assert_eq!(world.store.invite(&invite.id).unwrap().uses_count, 1);
        assert_eq!(world.store.group(&group.id).unwrap().member_count, 1);
    }

    #[tokio::test]
    async fn second_finalize_is_a_replay() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let intent = paid_intent(&group, &invite);
        let finalizer = world.finalizer();

        let cmd = FinalizeJoinCommand {
            source: FinalizeSource::Intent(intent),
            payment_id: "pay_1".to_string(),
        };
        let first = finalizer.handle(cmd.clone()).await.unwrap();
        let second = finalizer.handle(cmd).await.unwrap();

        assert!(second.replayed);
        assert_eq!(second.transaction.id, first.transaction.id);
        assert_eq!(world.store.all_transactions().len(), 1);
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().total_earned,
            Money::from_minor(18_000)
        );
        assert_eq!(world.store.invite(&invite.id).unwrap().uses_count, 1);
        assert_eq!(world.store.members_of(&group.id).len(), 2);
    }

    #[tokio::test]
    async fn concurrent_finalizers_credit_once() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let intent = paid_intent(&group, &invite);
        let finalizer = world.finalizer();

        let cmd = FinalizeJoinCommand {
            source: FinalizeSource::Intent(intent),
            payment_id: "pay_race".to_string(),
        };
        let (a, b) = tokio::join!(finalizer.handle(cmd.clone()), finalizer.handle(cmd));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.transaction.id, b.transaction.id);
        assert_eq!(world.store.all_transactions().len(), 1);
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().total_earned,
            Money::from_minor(18_000)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_finalizers_spend_one_invite_use() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, Some(1));
        let intent = paid_intent(&group, &invite);
        let finalizer = Arc::new(JoinFinalizer::new(
            Arc::new(SlowOwnerLookup(world.store.clone())),
            world.store.clone(),
            world.store.clone(),
            world.settings.clone(),
        ));

        let cmd = FinalizeJoinCommand {
            source: FinalizeSource::Intent(intent),
            payment_id: "pay_1".to_string(),
        };
        let first = tokio::spawn({
            let finalizer = finalizer.clone();
            let cmd = cmd.clone();
            async move { finalizer.handle(cmd).await }
        });
        let second = tokio::spawn({
            let finalizer = finalizer.clone();
            async move { finalizer.handle(cmd).await }
        });
        let (a, b) = (first.await.unwrap().unwrap(), second.await.unwrap().unwrap());

        assert_eq!(a.transaction.id, b.transaction.id);
        assert_ne!(a.replayed, b.replayed);
        assert_eq!(world.store.invite(&invite.id).unwrap().uses_count, 1);
        assert_eq!(world.store.all_transactions().len(), 1);
        assert_eq!(world.store.members_of(&group.id).len(), 2);
        assert_eq!(world.store.group(&group.id).unwrap().member_count, 1);
    }

    #[tokio::test]
    async fn failed_commit_leaves_nothing_and_retry_credits() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let intent = paid_intent(&group, &invite);
        let finalizer = JoinFinalizer::new(
            world.store.clone(),
            world.store.clone(),
            Arc::new(FirstCommitFails {
                inner: world.store.clone(),
                failed: Default::default(),
            }),
            world.settings.clone(),
        );
        let cmd = FinalizeJoinCommand {
            source: FinalizeSource::Intent(intent),
            payment_id: "pay_retry".to_string(),
        };

        let err = finalizer.handle(cmd.clone()).await.unwrap_err();
        assert!(matches!(err, JoinError::Infrastructure(_)));
        assert!(world.store.all_transactions().is_empty());
        assert!(world.store.earnings_of(&owner).is_none());
        assert_eq!(world.store.invite(&invite.id).unwrap().uses_count, 0);
        assert_eq!(world.store.members_of(&group.id).len(), 1);

        let retried = finalizer.handle(cmd).await.unwrap();

        assert!(!retried.replayed);
        assert!(retried.membership_created);
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(18_000)
        );
        assert_eq!(world.store.invite(&invite.id).unwrap().uses_count, 1);
    }

    #[tokio::test]
    async fn paid_join_past_invite_limit_still_seats_buyer() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, Some(1));
        let finalizer = world.finalizer();

        finalizer
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(paid_intent(&group, &invite)),
                payment_id: "pay_a".to_string(),
            })
            .await
            .unwrap();
        let late = finalizer
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(paid_intent(&group, &invite)),
                payment_id: "pay_b".to_string(),
            })
            .await
            .unwrap();

        assert!(late.membership_created);
        assert_eq!(world.store.invite(&invite.id).unwrap().uses_count, 1);
        assert_eq!(world.store.group(&group.id).unwrap().member_count, 2);
    }

    #[tokio::test]
    async fn hold_window_credits_pending() {
        let world = World::new();
        world.update_settings(|s| s.hold_hours = 24);
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);

        let result = world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(paid_intent(&group, &invite)),
                payment_id: "pay_hold".to_string(),
            })
            .await
            .unwrap();

        assert!(result.transaction.pending_release_at.is_some());
        let earnings = world.store.earnings_of(&owner).unwrap();
        assert_eq!(earnings.pending_balance, Money::from_minor(18_000));
        assert_eq!(earnings.withdrawable_balance, Money::ZERO);
    }

    #[tokio::test]
    async fn free_seat_records_zero_sale_without_earnings() {
        let world = World::new();
        world.update_settings(|s| s.hold_hours = 24);
        let owner = UserId::new();
        let group = world.group(owner, 0, 4);
        let invite = world.invite(&group, None);

        let result = world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(paid_intent(&group, &invite)),
                payment_id: "free_1".to_string(),
            })
            .await
            .unwrap();

        assert!(result.transaction.net.is_zero());
        assert!(result.transaction.pending_release_at.is_none());
        assert!(world.store.earnings_of(&owner).is_none());
    }

    #[tokio::test]
    async fn last_seat_activates_group() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 1);
        let invite = world.invite(&group, None);

        let result = world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(paid_intent(&group, &invite)),
                payment_id: "pay_last".to_string(),
            })
            .await
            .unwrap();

        assert!(result.group_activated);
        let stored = world.store.group(&group.id).unwrap();
        assert_eq!(stored.status, GroupStatus::Active);
        assert!(stored.start_date.is_some());
        assert!(stored.end_date.is_some());
    }

    #[tokio::test]
    async fn missing_owner_is_fatal_and_writes_nothing() {
        let world = World::new();
        let group = Group::new("Orphan", UserId::new(), Money::from_minor(20_000), 4, Timestamp::now())
            .unwrap();
        GroupRepository::save(&*world.store, &group).await.unwrap();
        let invite = world.invite(&group, None);

        let err = world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(paid_intent(&group, &invite)),
                payment_id: "pay_orphan".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::NoOwner);
        assert!(err.is_integrity_violation());
        assert!(world.store.all_transactions().is_empty());
        assert!(world.store.members_of(&group.id).is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Direct purchases
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn settles_pending_purchase_with_its_recorded_split() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let buyer = UserId::new();
        let split = FeeSplit::compute(group.share_price, Percentage::try_new(10).unwrap());
        let pending = GroupTransaction::pending(group.id, owner, buyer, split, Some("order_d".to_string()), Timestamp::now());
        world.store.insert_pending(&pending).await.unwrap();

        // A later cut change does not touch an already quoted sale.
        world.update_settings(|s| s.platform_cut_percent = Percentage::try_new(20).unwrap());

        let result = world
            .finalizer()
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::PendingTransaction(pending.clone()),
                payment_id: "pay_direct".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.transaction.id, pending.id);
        assert_eq!(result.transaction.status, TransactionStatus::Paid);
        assert_eq!(result.transaction.fee_amount, Money::from_minor(2_000));
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(18_000)
        );
    }
}
