//! Seat sale repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupId, InviteId, Timestamp, TransactionId, UserId};
use crate::domain::group::{Group, GroupMembership};
use crate::domain::ledger::{EarningsAccount, GroupTransaction};

use super::{Page, PageRequest};

/// How the paid sale row comes into being.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleRecord {
    /// Insert a new paid row (invite joins).
    New(GroupTransaction),
    /// Settle an existing pending direct purchase in place.
    SettlePending {
        id: TransactionId,
        pending_release_at: Option<Timestamp>,
    },
}

/// Every write of a join finalization, applied by
/// [`GroupTransactionRepository::commit_sale`] as one unit.
#[derive(Debug, Clone)]
pub struct SaleCommit {
    pub payment_id: String,
    pub record: SaleRecord,
    /// Seat for the buyer unless they already hold a non-left membership.
    pub membership: GroupMembership,
    /// Invite whose use is counted when the membership is new.
    pub invite_id: Option<InviteId>,
    pub now: Timestamp,
}

/// What happened to the invite use counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteUse {
    /// No invite, or the buyer already had a seat.
    NotCounted,
    Counted,
    /// The invite had already reached `max_uses`; the counter was left alone.
    OverLimit,
}

/// A sale written by this call.
#[derive(Debug, Clone)]
pub struct CommittedSale {
    pub transaction: GroupTransaction,
    /// The group after the seat was counted; `None` when the buyer was
    /// already a member.
    pub seated: Option<Group>,
    pub group_activated: bool,
    /// Owner account after the credit; `None` for zero-net sales.
    pub earnings: Option<EarningsAccount>,
    pub invite_use: InviteUse,
}

impl CommittedSale {
    pub fn membership_created(&self) -> bool {
        self.seated.is_some()
    }
}

/// Result of [`GroupTransactionRepository::commit_sale`].
#[derive(Debug, Clone)]
pub enum SaleOutcome {
    Committed(CommittedSale),
    /// The payment id was already recorded; nothing was written.
    Replayed(GroupTransaction),
}

impl SaleOutcome {
    pub fn transaction(&self) -> &GroupTransaction {
        match self {
            SaleOutcome::Committed(sale) => &sale.transaction,
            SaleOutcome::Replayed(tx) => tx,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, SaleOutcome::Replayed(_))
    }
}

/// Repository port for seat sale records.
///
/// `payment_id` is unique: the store is the final arbiter of whether a
/// payment has been recorded, and the only writer of finalization effects.
#[async_trait]
pub trait GroupTransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<GroupTransaction>, DomainError>;

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<GroupTransaction>, DomainError>;

    async fn find_pending_by_order_id(&self, order_id: &str) -> Result<Option<GroupTransaction>, DomainError>;

    /// The buyer's pending direct purchase for the group, if any.
    async fn find_pending_for(
        &self,
        group_id: &GroupId,
        buyer_id: &UserId,
    ) -> Result<Option<GroupTransaction>, DomainError>;

    /// Insert a pending direct-purchase row.
    async fn insert_pending(&self, tx: &GroupTransaction) -> Result<(), DomainError>;

    /// Finalizes a confirmed payment in one atomic step.
    ///
    /// The payment id is claimed first: if it is already recorded, or the
    /// pending row was settled by someone else, the recorded row comes back
    /// as `Replayed` and nothing else is written. Otherwise the sale row, the
    /// membership with its seat count and group activation, the owner's
    /// earnings credit (bucket chosen by `pending_release_at`, skipped for a
    /// zero net) and the invite use all commit together or not at all.
    ///
    /// # Errors
    ///
    /// - `GroupNotFound` if the group row is missing
    /// - `TransactionNotFound` / `InvalidStateTransition` for a settle of a
    ///   missing or refunded row
    async fn commit_sale(&self, commit: &SaleCommit) -> Result<SaleOutcome, DomainError>;

    /// Paid sales owned by the user, newest first.
    async fn list_paid_by_owner(
        &self,
        owner_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<GroupTransaction>, DomainError>;
}
