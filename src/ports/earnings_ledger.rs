//! Earnings ledger port.

use async_trait::async_trait;

use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{DomainError, Money, Timestamp, UserId};
use crate::domain::ledger::{EarningsAccount, MaturationOutcome};

/// Default number of transactions matured per pass.
pub const MATURATION_BATCH_LIMIT: usize = 500;

#[async_trait]
pub trait EarningsLedger: Send + Sync {
    async fn find(&self, owner_id: &UserId) -> Result<Option<EarningsAccount>, DomainError>;

    /// Upserts the owner's account and adds `net` to the bucket and to
    /// `total_earned` in one atomic increment.
    async fn credit(
        &self,
        owner_id: &UserId,
        bucket: EarningsBucket,
        net: Money,
        now: Timestamp,
    ) -> Result<EarningsAccount, DomainError>;

    /// Matures the owner's paid sales whose hold has elapsed.
    ///
    /// Up to `limit` transactions with `pending_release_at <= now`, oldest
    /// release first, have their hold cleared and their summed net moved
    /// from pending to withdrawable, all in one atomic step. A no-op when
    /// nothing is due.
    async fn mature(
        &self,
        owner_id: &UserId,
        now: Timestamp,
        limit: usize,
    ) -> Result<MaturationOutcome, DomainError>;
}
