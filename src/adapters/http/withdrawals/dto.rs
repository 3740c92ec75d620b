//! Request and response types for withdrawal endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{ApproveWithdrawalResult, PayoutOutcome};
use crate::domain::foundation::{Money, Timestamp, UserId, WithdrawalId};
use crate::domain::withdrawal::{
    PayoutDetails, PayoutMethod, WithdrawalRequest, WithdrawalSource, WithdrawalStatus,
};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/withdrawals`.
///
/// Payout fields sit at the top level: `upi_id` for UPI, or
/// `account_number` + `ifsc_code` (+ `account_holder`) for bank transfers.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWithdrawalRequest {
    #[serde(default = "default_source")]
    pub source: WithdrawalSource,
    pub amount: Money,
    pub payout_method: PayoutMethod,
    #[serde(flatten)]
    pub payout_details: PayoutDetails,
}

fn default_source() -> WithdrawalSource {
    WithdrawalSource::Earnings
}

/// `GET /api/admin/withdrawals` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminWithdrawalsQuery {
    pub status: Option<WithdrawalStatus>,
    pub source: Option<WithdrawalSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectWithdrawalRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettleWithdrawalRequest {
    pub utr: Option<String>,
    pub payout_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalResponse {
    pub id: WithdrawalId,
    pub owner_id: UserId,
    pub source: WithdrawalSource,
    pub amount: Money,
    pub payout_method: PayoutMethod,
    pub payout_details: PayoutDetails,
    pub status: WithdrawalStatus,
    pub payout_id: Option<String>,
    pub utr: Option<String>,
    pub reject_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Keeps the last four characters of an account number.
pub fn mask_account(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    let visible = chars.len().min(4);
    let hidden = chars.len() - visible;
    std::iter::repeat('X')
        .take(hidden)
        .chain(chars[hidden..].iter().copied())
        .collect()
}

impl From<WithdrawalRequest> for WithdrawalResponse {
    fn from(request: WithdrawalRequest) -> Self {
        let mut payout_details = request.payout_details;
        payout_details.account_number = payout_details.account_number.as_deref().map(mask_account);
        Self {
            id: request.id,
            owner_id: request.owner_id,
            source: request.source,
            amount: request.amount,
            payout_method: request.payout_method,
            payout_details,
            status: request.status,
            payout_id: request.payout_id,
            utr: request.utr,
            reject_reason: request.reject_reason,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApproveWithdrawalResponse {
    pub withdrawal: WithdrawalResponse,
    /// `paid`, `in_flight` or `unknown`.
    pub payout: &'static str,
}

impl From<ApproveWithdrawalResult> for ApproveWithdrawalResponse {
    fn from(result: ApproveWithdrawalResult) -> Self {
        let payout = match result.outcome {
            PayoutOutcome::Paid => "paid",
            PayoutOutcome::InFlight => "in_flight",
            PayoutOutcome::Unknown => "unknown",
        };
        Self {
            withdrawal: result.request.into(),
            payout,
        }
    }
}
