//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! ## Repository Ports
//!
//! - `GroupRepository` - Groups and memberships
//! - `InviteRepository` - Invite lookup and storage
//! - `JoinIntentRepository` - Join intents with compare-and-swap status changes
//! - `GroupTransactionRepository` - Seat sales, unique by payment id, atomic finalization
//! - `WithdrawalRepository` - Withdrawal requests with atomic reserve/refund
//!
//! ## Ledger Ports
//!
//! - `WalletLedger` - Conditional wallet debit/credit with idempotency keys
//! - `EarningsLedger` - Earnings credit and lazy maturation
//!
//! ## External Ports
//!
//! - `PaymentGateway` - Checkout orders and payouts
//! - `PlatformSettingsSource` - Current money settings

mod earnings_ledger;
mod group_repository;
mod group_transaction_repository;
mod invite_repository;
mod join_intent_repository;
mod pagination;
mod payment_gateway;
mod settings_source;
mod wallet_ledger;
mod withdrawal_repository;

pub use earnings_ledger::{EarningsLedger, MATURATION_BATCH_LIMIT};
pub use group_repository::GroupRepository;
pub use group_transaction_repository::{
    CommittedSale, GroupTransactionRepository, InviteUse, SaleCommit, SaleOutcome, SaleRecord,
};
pub use invite_repository::InviteRepository;
pub use join_intent_repository::{CreateIntentOutcome, JoinIntentRepository};
pub use pagination::{Page, PageRequest};
pub use payment_gateway::{
    CreateOrderRequest, CreatePayoutRequest, GatewayOrder, PaymentError, PaymentErrorCode,
    PaymentGateway, Payout, PayoutStatus,
};
pub use settings_source::PlatformSettingsSource;
pub use wallet_ledger::WalletLedger;
pub use withdrawal_repository::WithdrawalRepository;
