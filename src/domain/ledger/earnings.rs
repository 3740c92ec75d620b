//! Owner earnings balances.

use serde::{Deserialize, Serialize};

use crate::domain::fees::EarningsBucket;
use crate::domain::foundation::{Money, Timestamp, UserId};

/// Per-owner earnings balances.
///
/// All balances are non-negative and `total_earned` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsAccount {
    pub owner_id: UserId,
    pub withdrawable_balance: Money,
    pub pending_balance: Money,
    pub total_earned: Money,
    pub updated_at: Timestamp,
}

impl EarningsAccount {
    pub fn empty(owner_id: UserId, now: Timestamp) -> Self {
        Self {
            owner_id,
            withdrawable_balance: Money::ZERO,
            pending_balance: Money::ZERO,
            total_earned: Money::ZERO,
            updated_at: now,
        }
    }

    /// Adds a sale's net to the given bucket and to the lifetime total.
    pub fn credit(&mut self, bucket: EarningsBucket, net: Money, now: Timestamp) {
        match bucket {
            EarningsBucket::Pending => self.pending_balance = self.pending_balance + net,
            EarningsBucket::Withdrawable => {
                self.withdrawable_balance = self.withdrawable_balance + net
            }
        }
        self.total_earned = self.total_earned + net;
        self.updated_at = now;
    }

    /// Takes `amount` out of the withdrawable balance.
    ///
    /// Returns `false` and leaves the account untouched when the balance is short.
    pub fn reserve(&mut self, amount: Money, now: Timestamp) -> bool {
        match self.withdrawable_balance.checked_sub(amount) {
            Some(rest) if !rest.is_negative() => {
                self.withdrawable_balance = rest;
                self.updated_at = now;
                true
            }
            _ => false,
        }
    }

    /// Puts a previously reserved amount back.
    pub fn restore(&mut self, amount: Money, now: Timestamp) {
        self.withdrawable_balance = self.withdrawable_balance + amount;
        self.updated_at = now;
    }

    /// Moves `amount` from pending to withdrawable.
    ///
    /// Clamped to the pending balance so a drifted row cannot go negative.
    pub fn mature(&mut self, amount: Money, now: Timestamp) -> Money {
        let moved = if amount > self.pending_balance {
            self.pending_balance
        } else {
            amount
        };
        self.pending_balance = self.pending_balance - moved;
        self.withdrawable_balance = self.withdrawable_balance + moved;
        self.updated_at = now;
        moved
    }
}

/// What a maturation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaturationOutcome {
    /// Amount moved from pending to withdrawable.
    pub matured: Money,
    /// Transactions whose hold was cleared.
    pub transactions: usize,
}

impl MaturationOutcome {
    pub fn is_noop(&self) -> bool {
        self.transactions == 0
    }
}
