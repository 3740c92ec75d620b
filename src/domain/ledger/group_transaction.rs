//! Seat sale records.

use serde::{Deserialize, Serialize};

use crate::domain::fees::FeeSplit;
use crate::domain::foundation::{
    GroupId, Money, Percentage, StateMachine, Timestamp, TransactionId, UserId, ValidationError,
};

/// Status of a seat sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Order created at the provider, payment not yet confirmed.
    Pending,
    Paid,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "paid" => Some(TransactionStatus::Paid),
            "refunded" => Some(TransactionStatus::Refunded),
            _ => None,
        }
    }
}

impl StateMachine for TransactionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TransactionStatus::*;
        matches!((self, target), (Pending, Paid) | (Pending, Refunded) | (Paid, Refunded))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TransactionStatus::*;
        match self {
            Pending => vec![Paid, Refunded],
            Paid => vec![Refunded],
            Refunded => vec![],
        }
    }
}

/// One seat sale: who bought into which group, and how the price was split.
///
/// `gross == fee_amount + net` always holds. `payment_id` is unique across
/// all transactions and is the deduplication key for finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTransaction {
    pub id: TransactionId,
    pub group_id: GroupId,
    pub owner_id: UserId,
    pub buyer_id: UserId,
    pub gross: Money,
    pub fee_percent: Percentage,
    pub fee_amount: Money,
    pub net: Money,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: TransactionStatus,
    /// Set while the net sits in the owner's pending bucket.
    pub pending_release_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl GroupTransaction {
    /// A sale whose payment is already confirmed.
    #[allow(clippy::too_many_arguments)]
    pub fn paid(
        group_id: GroupId,
        owner_id: UserId,
        buyer_id: UserId,
        split: FeeSplit,
        order_id: Option<String>,
        payment_id: String,
        pending_release_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            group_id,
            owner_id,
            buyer_id,
            gross: split.gross,
            fee_percent: split.fee_percent,
            fee_amount: split.fee_amount,
            net: split.net,
            order_id,
            payment_id: Some(payment_id),
            status: TransactionStatus::Paid,
            pending_release_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// A direct purchase waiting on the provider.
    pub fn pending(
        group_id: GroupId,
        owner_id: UserId,
        buyer_id: UserId,
        split: FeeSplit,
        order_id: Option<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            group_id,
            owner_id,
            buyer_id,
            gross: split.gross,
            fee_percent: split.fee_percent,
            fee_amount: split.fee_amount,
            net: split.net,
            order_id,
            payment_id: None,
            status: TransactionStatus::Pending,
            pending_release_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The split recorded on this row.
    pub fn split(&self) -> FeeSplit {
        FeeSplit {
            gross: self.gross,
            fee_percent: self.fee_percent,
            fee_amount: self.fee_amount,
            net: self.net,
        }
    }

    /// Confirms a pending sale with the provider's payment id.
    pub fn settle(
        &mut self,
        payment_id: String,
        pending_release_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TransactionStatus::Paid)?;
        self.payment_id = Some(payment_id);
        self.pending_release_at = pending_release_at;
        self.updated_at = now;
        Ok(())
    }

    /// True once the hold on this sale has elapsed at `now`.
    pub fn is_due(&self, now: &Timestamp) -> bool {
        self.status == TransactionStatus::Paid
            && self
                .pending_release_at
                .is_some_and(|release| !release.is_after(now))
    }
}
