//! Wallet ledger port.
//!
//! Every balance change is a single conditional update that also appends
//! exactly one `WalletTransaction`. Nothing reads a balance, computes a new
//! one in memory and writes it back.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, UserId};
use crate::domain::ledger::{
    WalletAccount, WalletEntry, WalletMutation, WalletTransaction, WalletTransactionFilter,
};

use super::Page;

#[async_trait]
pub trait WalletLedger: Send + Sync {
    async fn find_account(&self, owner_id: &UserId) -> Result<Option<WalletAccount>, DomainError>;

    /// Increments the balance, creating the wallet if needed.
    ///
    /// A repeated idempotency key returns the original transaction as
    /// `Replayed` and changes nothing.
    async fn credit(
        &self,
        owner_id: &UserId,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError>;

    /// Decrements the balance only if it covers `amount`.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` (with `available`/`requested` details) when the
    ///   guard fails; nothing is written
    async fn debit(
        &self,
        owner_id: &UserId,
        amount: Money,
        entry: WalletEntry,
    ) -> Result<WalletMutation, DomainError>;

    /// The owner's wallet transactions, newest first.
    async fn transactions(
        &self,
        owner_id: &UserId,
        filter: &WalletTransactionFilter,
    ) -> Result<Page<WalletTransaction>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn WalletLedger) {}
    }
}
