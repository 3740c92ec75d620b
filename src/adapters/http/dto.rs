//! Response shapes shared by several route groups.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GroupId, Money, Timestamp, TransactionId, UserId};
use crate::domain::ledger::{GroupTransaction, TransactionStatus};
use crate::ports::{Page, PageRequest};

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable code for programmatic handling, e.g. `EXPIRED`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Paging
// ════════════════════════════════════════════════════════════════════════════════

/// `?page=&limit=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.limit.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub has_more: bool,
    pub page: u32,
    pub limit: u32,
}

impl<T> PageResponse<T> {
    pub fn from_page<S>(page: Page<S>, request: PageRequest) -> Self
    where
        T: From<S>,
    {
        Self {
            items: page.items.into_iter().map(T::from).collect(),
            total: page.total,
            has_more: page.has_more,
            page: request.page,
            limit: request.limit,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Seat sales
// ════════════════════════════════════════════════════════════════════════════════

/// One seat sale with its fee split.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: TransactionId,
    pub group_id: GroupId,
    pub owner_id: UserId,
    pub buyer_id: UserId,
    pub gross: Money,
    pub fee_percent: u8,
    pub fee_amount: Money,
    pub net: Money,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// Set while the owner's share is still held.
    pub pending_release_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<GroupTransaction> for TransactionResponse {
    fn from(tx: GroupTransaction) -> Self {
        Self {
            id: tx.id,
            group_id: tx.group_id,
            owner_id: tx.owner_id,
            buyer_id: tx.buyer_id,
            gross: tx.gross,
            fee_percent: tx.fee_percent.value(),
            fee_amount: tx.fee_amount,
            net: tx.net,
            status: tx.status,
            order_id: tx.order_id,
            payment_id: tx.payment_id,
            pending_release_at: tx.pending_release_at,
            created_at: tx.created_at,
        }
    }
}

/// What the client needs to open the gateway checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub key_id: String,
    pub order_id: Option<String>,
    pub amount: Money,
    pub currency: String,
}
