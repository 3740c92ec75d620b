//! Seatshare - Payment and ledger core for a subscription-sharing marketplace
//!
//! Users buy seats in shared subscription groups. Each sale is split into a
//! platform fee and the owner's net, owner earnings mature after a hold
//! window, and owners withdraw them to UPI or bank destinations. Every
//! money-moving operation is idempotent under retries and concurrent
//! duplicates.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
