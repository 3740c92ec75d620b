//! Join intent repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupId, JoinIntentId, Timestamp, UserId};
use crate::domain::invite::InviteCode;
use crate::domain::join::JoinIntent;

/// Result of [`JoinIntentRepository::create_if_no_pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateIntentOutcome {
    Created(JoinIntent),
    /// An initiated intent already existed for (user, group).
    Existing(JoinIntent),
}

impl CreateIntentOutcome {
    pub fn intent(&self) -> &JoinIntent {
        match self {
            CreateIntentOutcome::Created(i) | CreateIntentOutcome::Existing(i) => i,
        }
    }

    pub fn into_intent(self) -> JoinIntent {
        match self {
            CreateIntentOutcome::Created(i) | CreateIntentOutcome::Existing(i) => i,
        }
    }
}

/// Repository port for join intents.
///
/// Status changes are compare-and-swap: they only apply while the intent is
/// still `initiated`, and report whether they applied.
#[async_trait]
pub trait JoinIntentRepository: Send + Sync {
    /// Inserts `intent` unless an initiated intent exists for the same
    /// (user, group), in which case that one is returned.
    async fn create_if_no_pending(&self, intent: &JoinIntent) -> Result<CreateIntentOutcome, DomainError>;

    async fn find_by_id(&self, id: &JoinIntentId) -> Result<Option<JoinIntent>, DomainError>;

    /// Finds the intent carrying a provider order id.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<JoinIntent>, DomainError>;

    async fn find_pending(
        &self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<Option<JoinIntent>, DomainError>;

    /// Number of initiated intents opened through the invite. Each one
    /// holds a use that `max_uses` must leave room for.
    async fn count_open_for_invite(&self, code: &InviteCode) -> Result<u32, DomainError>;

    /// Records a provider order id on an initiated intent.
    async fn set_order_id(&self, id: &JoinIntentId, order_id: &str) -> Result<(), DomainError>;

    /// initiated -> paid. Returns `false` if the intent had already moved.
    async fn mark_paid(
        &self,
        id: &JoinIntentId,
        payment_id: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// initiated -> failed.
    async fn mark_failed(&self, id: &JoinIntentId, now: Timestamp) -> Result<bool, DomainError>;

    /// initiated -> expired.
    async fn expire(&self, id: &JoinIntentId, now: Timestamp) -> Result<bool, DomainError>;
}
