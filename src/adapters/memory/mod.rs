//! In-memory store implementing every repository and ledger port.
//!
//! All tables sit behind one lock so the multi-table operations (member add,
//! reserve-and-insert, reject-and-refund, maturation) are atomic exactly as
//! their SQL transactions are.
//!
//! # Panics
//!
//! Methods panic if the internal lock is poisoned. Used by tests and local
//! development; production runs on the Postgres adapters.

mod earnings;
mod groups;
mod invites;
mod join_intents;
mod store;
mod transactions;
mod wallet;
mod withdrawals;

pub use store::InMemoryStore;
