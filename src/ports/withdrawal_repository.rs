//! Withdrawal repository port.
//!
//! Reserving funds and restoring them are only ever done together with the
//! withdrawal row write, so both live here rather than on the ledgers.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, Timestamp, UserId, WithdrawalId};
use crate::domain::withdrawal::{WithdrawalFilter, WithdrawalRequest, WithdrawalStatus};

#[async_trait]
pub trait WithdrawalRepository: Send + Sync {
    async fn find_by_id(&self, id: &WithdrawalId) -> Result<Option<WithdrawalRequest>, DomainError>;

    /// Matching requests, newest first.
    async fn list(&self, filter: &WithdrawalFilter) -> Result<Vec<WithdrawalRequest>, DomainError>;

    /// Sum of the owner's open requests.
    async fn open_total(&self, owner_id: &UserId) -> Result<Money, DomainError>;

    /// Atomically reserves the amount from the request's source balance and
    /// inserts the request.
    ///
    /// Wallet reservations append a `withdrawal` debit to the wallet log.
    ///
    /// # Errors
    ///
    /// - `DuplicateRequest` if an open request exists for (owner, source)
    /// - `InsufficientFunds` if the balance guard fails
    ///
    /// Nothing is written on error.
    async fn create_reserving(&self, request: &WithdrawalRequest) -> Result<(), DomainError>;

    /// Writes `request` only if the stored status is still `expected`.
    ///
    /// Returns `false` when another writer moved the request first.
    async fn update_if_status(
        &self,
        request: &WithdrawalRequest,
        expected: WithdrawalStatus,
    ) -> Result<bool, DomainError>;

    /// Marks an open request rejected and restores its amount to the source
    /// balance in one atomic step, re-checking the status inside it.
    ///
    /// # Errors
    ///
    /// - `WithdrawalNotFound`
    /// - `InvalidStateTransition` (with a `current` detail) if the request is
    ///   already paid or rejected; nothing is refunded
    async fn reject_with_refund(
        &self,
        id: &WithdrawalId,
        reason: &str,
        now: Timestamp,
    ) -> Result<WithdrawalRequest, DomainError>;
}
