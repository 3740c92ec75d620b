//! Request and response types for invite, join and purchase endpoints.

use serde::{Deserialize, Serialize};

use crate::adapters::http::dto::{CheckoutResponse, TransactionResponse};
use crate::application::handlers::{
    ConfirmDevJoinResult, InitiateDirectPurchaseResult, InitiateJoinResult, ResolveInviteResult,
};
use crate::domain::foundation::{GroupId, InviteId, JoinIntentId, Money, Timestamp};
use crate::domain::group::GroupStatus;
use crate::domain::invite::{GroupInvite, InviteStatus};
use crate::domain::join::{JoinIntent, JoinIntentStatus, PaymentMethod};

// ════════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/invites/:code/join`.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Gateway
}

/// Body of `POST /api/invites/:code/join/confirm`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmJoinRequest {
    #[serde(alias = "joinIntentId")]
    pub join_intent_id: JoinIntentId,
}

/// Body of `POST /api/groups/:id/invites`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueInviteRequest {
    pub max_uses: Option<u32>,
    pub expires_in_minutes: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════════

/// Public preview of the group behind an invite.
#[derive(Debug, Clone, Serialize)]
pub struct InvitePreviewResponse {
    pub group_id: GroupId,
    pub name: String,
    pub status: GroupStatus,
    pub share_price: Money,
    pub share_limit: u32,
    pub member_count: u32,
    pub seats_left: u32,
    pub invite_code: String,
    pub expires_at: Option<Timestamp>,
    pub platform_fee_percent: u8,
}

impl From<ResolveInviteResult> for InvitePreviewResponse {
    fn from(result: ResolveInviteResult) -> Self {
        Self {
            group_id: result.group_id,
            name: result.name,
            status: result.status,
            share_price: result.share_price,
            share_limit: result.share_limit,
            member_count: result.member_count,
            seats_left: result.seats_left,
            invite_code: result.invite_code,
            expires_at: result.expires_at,
            platform_fee_percent: result.platform_fee_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub id: InviteId,
    pub code: String,
    pub group_id: GroupId,
    pub status: InviteStatus,
    pub max_uses: Option<u32>,
    pub uses_count: u32,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<GroupInvite> for InviteResponse {
    fn from(invite: GroupInvite) -> Self {
        Self {
            id: invite.id,
            code: invite.code.as_str().to_string(),
            group_id: invite.group_id,
            status: invite.status,
            max_uses: invite.max_uses,
            uses_count: invite.uses_count,
            expires_at: invite.expires_at,
            created_at: invite.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinIntentResponse {
    pub id: JoinIntentId,
    pub group_id: GroupId,
    pub invite_code: String,
    pub amount: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: JoinIntentStatus,
    pub order_id: Option<String>,
    pub created_at: Timestamp,
}

impl From<JoinIntent> for JoinIntentResponse {
    fn from(intent: JoinIntent) -> Self {
        Self {
            id: intent.id,
            group_id: intent.group_id,
            invite_code: intent.invite_code.as_str().to_string(),
            amount: intent.amount,
            currency: intent.currency,
            payment_method: intent.payment_method,
            status: intent.status,
            order_id: intent.order_id,
            created_at: intent.created_at,
        }
    }
}

fn checkout_for(intent: &JoinIntent, key_id: String) -> CheckoutResponse {
    CheckoutResponse {
        key_id,
        order_id: intent.order_id.clone(),
        amount: intent.amount,
        currency: intent.currency.clone(),
    }
}

/// Outcome of starting a join.
///
/// `next_step` tells the client what to do: nothing (`joined`), open the
/// gateway checkout (`pay`), or call the dev confirm route (`confirm`).
#[derive(Debug, Clone, Serialize)]
pub struct JoinResponse {
    pub next_step: &'static str,
    pub join_intent: JoinIntentResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutResponse>,
    /// True when an earlier initiated intent was returned instead of a new one.
    pub resumed: bool,
}

impl From<InitiateJoinResult> for JoinResponse {
    fn from(result: InitiateJoinResult) -> Self {
        match result {
            InitiateJoinResult::Joined {
                intent,
                transaction,
            } => Self {
                next_step: "joined",
                join_intent: intent.into(),
                transaction: Some(transaction.into()),
                checkout: None,
                resumed: false,
            },
            InitiateJoinResult::AwaitingPayment { intent, key_id } => Self {
                next_step: "pay",
                checkout: Some(checkout_for(&intent, key_id)),
                join_intent: intent.into(),
                transaction: None,
                resumed: false,
            },
            InitiateJoinResult::AwaitingConfirmation { intent } => Self {
                next_step: "confirm",
                join_intent: intent.into(),
                transaction: None,
                checkout: None,
                resumed: false,
            },
            InitiateJoinResult::Existing { intent, key_id } => {
                let (next_step, checkout) = match intent.payment_method {
                    PaymentMethod::Dev => ("confirm", None),
                    _ => ("pay", Some(checkout_for(&intent, key_id))),
                };
                Self {
                    next_step,
                    checkout,
                    join_intent: intent.into(),
                    transaction: None,
                    resumed: true,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmJoinResponse {
    pub join_intent: JoinIntentResponse,
    pub transaction: TransactionResponse,
    pub replayed: bool,
}

impl From<ConfirmDevJoinResult> for ConfirmJoinResponse {
    fn from(result: ConfirmDevJoinResult) -> Self {
        Self {
            join_intent: result.intent.into(),
            transaction: result.transaction.into(),
            replayed: result.replayed,
        }
    }
}

/// Outcome of a direct purchase.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub next_step: &'static str,
    pub transaction: TransactionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutResponse>,
    pub resumed: bool,
}

impl PurchaseResponse {
    pub fn new(result: InitiateDirectPurchaseResult, currency: String) -> Self {
        let (next_step, key_id, resumed) = match &result {
            InitiateDirectPurchaseResult::AwaitingPayment { key_id, .. } => {
                ("pay", Some(key_id.clone()), false)
            }
            InitiateDirectPurchaseResult::Existing { key_id, .. } => {
                ("pay", Some(key_id.clone()), true)
            }
            InitiateDirectPurchaseResult::Joined { .. } => ("joined", None, false),
        };
        let tx = result.transaction().clone();
        let checkout = key_id.map(|key_id| CheckoutResponse {
            key_id,
            order_id: tx.order_id.clone(),
            amount: tx.gross,
            currency,
        });
        Self {
            next_step,
            transaction: tx.into(),
            checkout,
            resumed,
        }
    }
}
