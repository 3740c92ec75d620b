//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, money, percentages, errors, state machines)
//! - `fees` - Fee and split calculation, hold-window release times
//! - `settings` - Platform money settings
//! - `group` - Groups, seats and memberships
//! - `invite` - Invite codes and their usability checks
//! - `join` - Join intents and their lifecycle
//! - `ledger` - Wallet and earnings balances, seat sale records
//! - `withdrawal` - Withdrawal requests and payout destinations
//! - `webhook` - Gateway signature verification and event parsing

pub mod fees;
pub mod foundation;
pub mod group;
pub mod invite;
pub mod join;
pub mod ledger;
pub mod settings;
pub mod webhook;
pub mod withdrawal;
