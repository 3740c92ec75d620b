//! Request and response types for earnings and wallet endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::handlers::{EarningsSummary, GetWalletResult, TopUpWalletResult};
use crate::domain::foundation::{Money, Timestamp, WalletId, WalletTransactionId};
use crate::domain::ledger::{Direction, WalletSource, WalletTransaction, WalletTransactionFilter};

// ════════════════════════════════════════════════════════════════════════════════
// Earnings
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct EarningsSummaryResponse {
    pub withdrawable_balance: Money,
    pub pending_balance: Money,
    pub total_earned: Money,
    /// Amount moved from pending to withdrawable by this request.
    pub matured_now: Money,
    pub owned_groups: u32,
    pub pending_withdrawals: Money,
    pub min_withdrawal: Money,
    pub wallet_withdrawals_enabled: bool,
    pub earnings_withdrawals_enabled: bool,
    pub platform_cut_percent: u8,
}

impl From<EarningsSummary> for EarningsSummaryResponse {
    fn from(summary: EarningsSummary) -> Self {
        Self {
            withdrawable_balance: summary.withdrawable_balance,
            pending_balance: summary.pending_balance,
            total_earned: summary.total_earned,
            matured_now: summary.matured_now,
            owned_groups: summary.owned_groups,
            pending_withdrawals: summary.pending_withdrawals,
            min_withdrawal: summary.min_withdrawal,
            wallet_withdrawals_enabled: summary.wallet_withdrawals_enabled,
            earnings_withdrawals_enabled: summary.earnings_withdrawals_enabled,
            platform_cut_percent: summary.platform_cut_percent.value(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Wallet
// ════════════════════════════════════════════════════════════════════════════════

/// `GET /api/wallet/transactions` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletTransactionsQuery {
    /// `credit` or `debit`.
    #[serde(rename = "type")]
    pub direction: Option<Direction>,
    pub source: Option<WalletSource>,
    /// Case-insensitive match on the description.
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl WalletTransactionsQuery {
    pub fn to_filter(&self) -> WalletTransactionFilter {
        WalletTransactionFilter {
            direction: self.direction,
            source: self.source,
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            from: self.from.map(Timestamp::from_datetime),
            to: self.to.map(Timestamp::from_datetime),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(0),
        }
    }
}

/// Body of `POST /api/wallet/topup`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopUpRequest {
    pub amount: Money,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletResponse {
    /// Absent until the first credit opens the wallet.
    pub wallet_id: Option<WalletId>,
    pub balance: Money,
}

impl From<GetWalletResult> for WalletResponse {
    fn from(result: GetWalletResult) -> Self {
        Self {
            wallet_id: result.wallet_id,
            balance: result.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletTransactionResponse {
    pub id: WalletTransactionId,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: Money,
    pub balance_after: Money,
    pub source: WalletSource,
    pub description: String,
    pub reference: Option<String>,
    pub created_at: Timestamp,
}

impl From<WalletTransaction> for WalletTransactionResponse {
    fn from(tx: WalletTransaction) -> Self {
        Self {
            id: tx.id,
            direction: tx.direction,
            amount: tx.amount,
            balance_after: tx.balance_after,
            source: tx.source,
            description: tx.description,
            reference: tx.reference,
            created_at: tx.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopUpResponse {
    pub transaction: WalletTransactionResponse,
    pub balance: Money,
    pub replayed: bool,
}

impl From<TopUpWalletResult> for TopUpResponse {
    fn from(result: TopUpWalletResult) -> Self {
        Self {
            transaction: result.transaction.into(),
            balance: result.balance,
            replayed: result.replayed,
        }
    }
}
