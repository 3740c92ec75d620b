//! PostgreSQL adapters - Database implementations for repository and ledger ports.
//!
//! - `PostgresGroupRepository` - Groups and memberships
//! - `PostgresInviteRepository` - Invites and their use counter
//! - `PostgresJoinIntentRepository` - Join intents with compare-and-swap status updates
//! - `PostgresGroupTransactionRepository` - Seat sales, committed with their seat and credit in one transaction
//! - `PostgresWalletLedger` - Guarded wallet updates plus the wallet log
//! - `PostgresEarningsLedger` - Earnings credit and maturation as guarded UPDATEs
//! - `PostgresWithdrawalRepository` - Withdrawals with reserve and refund
//!
//! Schema lives in `migrations/` and is applied with `sqlx::migrate!`.

mod earnings;
mod groups;
mod invites;
mod join_intents;
mod rows;
mod transactions;
mod wallet;
mod withdrawals;

pub use earnings::PostgresEarningsLedger;
pub use groups::PostgresGroupRepository;
pub use invites::PostgresInviteRepository;
pub use join_intents::PostgresJoinIntentRepository;
pub use transactions::PostgresGroupTransactionRepository;
pub use wallet::PostgresWalletLedger;
pub use withdrawals::PostgresWithdrawalRepository;

use sqlx::PgPool;

use crate::domain::foundation::DomainError;

/// Applies pending migrations from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}
