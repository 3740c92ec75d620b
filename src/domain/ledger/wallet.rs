//! Wallet ledger types.
//!
//! A wallet's balance only changes together with exactly one appended
//! `WalletTransaction` recording the direction, amount and resulting balance.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, Timestamp, UserId, WalletId, WalletTransactionId};

/// A user's stored-value wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub id: WalletId,
    pub owner_id: UserId,
    /// Never negative.
    pub balance: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WalletAccount {
    /// Opens an empty wallet.
    pub fn open(owner_id: UserId, now: Timestamp) -> Self {
        Self {
            id: WalletId::new(),
            owner_id,
            balance: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Direction of a wallet mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "credit",
            Direction::Debit => "debit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit" => Some(Direction::Credit),
            "debit" => Some(Direction::Debit),
            _ => None,
        }
    }
}

/// What caused a wallet mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletSource {
    Cashback,
    Topup,
    Purchase,
    Refund,
    Reward,
    Admin,
    Withdrawal,
}

impl WalletSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletSource::Cashback => "cashback",
            WalletSource::Topup => "topup",
            WalletSource::Purchase => "purchase",
            WalletSource::Refund => "refund",
            WalletSource::Reward => "reward",
            WalletSource::Admin => "admin",
            WalletSource::Withdrawal => "withdrawal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cashback" => Some(WalletSource::Cashback),
            "topup" => Some(WalletSource::Topup),
            "purchase" => Some(WalletSource::Purchase),
            "refund" => Some(WalletSource::Refund),
            "reward" => Some(WalletSource::Reward),
            "admin" => Some(WalletSource::Admin),
            "withdrawal" => Some(WalletSource::Withdrawal),
            _ => None,
        }
    }
}

/// Describes a wallet mutation before it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletEntry {
    pub source: WalletSource,
    pub description: String,
    /// Free-form reference to the business object (intent id, withdrawal id).
    pub reference: Option<String>,
    /// Replaying a mutation with the same key returns the original transaction.
    pub idempotency_key: Option<String>,
}

impl WalletEntry {
    pub fn new(source: WalletSource, description: impl Into<String>) -> Self {
        Self {
            source,
            description: description.into(),
            reference: None,
            idempotency_key: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// One appended wallet ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: WalletTransactionId,
    pub wallet_id: WalletId,
    pub direction: Direction,
    pub amount: Money,
    /// Balance right after this row was written.
    pub balance_after: Money,
    pub source: WalletSource,
    pub description: String,
    pub reference: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: Timestamp,
}

impl WalletTransaction {
    /// Builds the row for a mutation that produced `balance_after`.
    pub fn record(
        wallet_id: WalletId,
        direction: Direction,
        amount: Money,
        balance_after: Money,
        entry: WalletEntry,
        now: Timestamp,
    ) -> Self {
        Self {
            id: WalletTransactionId::new(),
            wallet_id,
            direction,
            amount,
            balance_after,
            source: entry.source,
            description: entry.description,
            reference: entry.reference,
            idempotency_key: entry.idempotency_key,
            created_at: now,
        }
    }
}

/// Outcome of a wallet mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletMutation {
    /// The mutation was applied now.
    Applied(WalletTransaction),
    /// The idempotency key was seen before; this is the original row.
    Replayed(WalletTransaction),
}

impl WalletMutation {
    pub fn transaction(&self) -> &WalletTransaction {
        match self {
            WalletMutation::Applied(tx) | WalletMutation::Replayed(tx) => tx,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, WalletMutation::Replayed(_))
    }
}

/// Filter for listing wallet transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletTransactionFilter {
    pub direction: Option<Direction>,
    pub source: Option<WalletSource>,
    /// Case-insensitive substring match on the description.
    pub search: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub page: u32,
    pub limit: u32,
}

impl WalletTransactionFilter {
    /// Checks a transaction against every set criterion except paging.
    pub fn matches(&self, tx: &WalletTransaction) -> bool {
        if self.direction.is_some_and(|d| d != tx.direction) {
            return false;
        }
        if self.source.is_some_and(|s| s != tx.source) {
            return false;
        }
        if let Some(search) = &self.search {
            if !tx
                .description
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        if self.from.is_some_and(|from| tx.created_at.is_before(&from)) {
            return false;
        }
        if self.to.is_some_and(|to| tx.created_at.is_after(&to)) {
            return false;
        }
        true
    }

    /// Zero-based row offset for the requested page (pages start at 1).
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1) * self.limit() as usize
    }

    /// Page size, defaulting to 20 and capped at 100.
    pub fn limit(&self) -> u32 {
        match self.limit {
            0 => 20,
            n => n.min(100),
        }
    }
}
