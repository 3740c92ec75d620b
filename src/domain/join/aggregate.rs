//! Join intent aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    GroupId, JoinIntentId, Money, StateMachine, Timestamp, UserId, ValidationError,
    WalletTransactionId,
};
use crate::domain::invite::InviteCode;

use super::{JoinIntentStatus, PaymentMethod};

/// A user's attempt to buy a seat through an invite.
///
/// At most one `Initiated` intent exists per (user, group); the store
/// enforces this so concurrent attempts converge on a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinIntent {
    pub id: JoinIntentId,
    pub invite_code: InviteCode,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    pub status: JoinIntentStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JoinIntent {
    pub fn initiate(
        invite_code: InviteCode,
        group_id: GroupId,
        user_id: UserId,
        amount: Money,
        currency: impl Into<String>,
        payment_method: PaymentMethod,
        now: Timestamp,
    ) -> Self {
        Self {
            id: JoinIntentId::new(),
            invite_code,
            group_id,
            user_id,
            amount,
            currency: currency.into(),
            payment_method,
            order_id: None,
            payment_id: None,
            status: JoinIntentStatus::Initiated,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == JoinIntentStatus::Initiated
    }

    pub fn is_free(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn mark_paid(&mut self, payment_id: impl Into<String>, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(JoinIntentStatus::Paid)?;
        self.payment_id = Some(payment_id.into());
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_failed(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(JoinIntentStatus::Failed)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn expire(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(JoinIntentStatus::Expired)?;
        self.updated_at = now;
        Ok(())
    }

    /// Idempotency key for the wallet debit paying for this intent.
    pub fn wallet_debit_key(&self) -> String {
        format!("join:{}", self.id)
    }

    /// Synthetic payment id for a zero-price seat.
    pub fn free_payment_id(&self) -> String {
        format!("free_{}", self.id)
    }
}

/// Synthetic payment id for a wallet-funded seat.
pub fn wallet_payment_id(txn: &WalletTransactionId) -> String {
    format!("wallet_{}", txn)
}

/// Synthetic payment id for a development confirmation.
pub fn dev_payment_id() -> String {
    format!("dev_{}", uuid::Uuid::new_v4().simple())
}
