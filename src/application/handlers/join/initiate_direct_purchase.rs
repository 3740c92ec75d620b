//! InitiateDirectPurchaseHandler - Command handler for buying a seat without an invite.
//!
//! The split is quoted when the order is created and stored on a `pending`
//! transaction; the finalizer settles that row when the payment arrives.

use std::sync::Arc;

use crate::domain::fees::FeeSplit;
use crate::domain::foundation::{GroupId, Timestamp, UserId};
use crate::domain::group::GroupStatus;
use crate::domain::join::{dev_payment_id, JoinError};
use crate::domain::ledger::GroupTransaction;
use crate::ports::{
    CreateOrderRequest, GroupRepository, GroupTransactionRepository, PaymentGateway,
    PlatformSettingsSource,
};

use super::finalizer::{FinalizeJoinCommand, FinalizeSource, JoinFinalizer};

/// Command to buy a seat in a group directly.
#[derive(Debug, Clone)]
pub struct InitiateDirectPurchaseCommand {
    pub group_id: GroupId,
    pub buyer_id: UserId,
}

/// Result of starting a direct purchase.
#[derive(Debug, Clone)]
pub enum InitiateDirectPurchaseResult {
    /// Checkout order created; pay it with `key_id`.
    AwaitingPayment {
        transaction: GroupTransaction,
        key_id: String,
    },
    /// A pending purchase already existed for this buyer and group.
    Existing {
        transaction: GroupTransaction,
        key_id: String,
    },
    /// Finalized immediately (dev mode or free seat).
    Joined { transaction: GroupTransaction },
}

impl InitiateDirectPurchaseResult {
    pub fn transaction(&self) -> &GroupTransaction {
        match self {
            InitiateDirectPurchaseResult::AwaitingPayment { transaction, .. }
            | InitiateDirectPurchaseResult::Existing { transaction, .. }
            | InitiateDirectPurchaseResult::Joined { transaction } => transaction,
        }
    }
}

/// Handler for direct purchases.
pub struct InitiateDirectPurchaseHandler {
    groups: Arc<dyn GroupRepository>,
    transactions: Arc<dyn GroupTransactionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: Arc<dyn PlatformSettingsSource>,
    finalizer: Arc<JoinFinalizer>,
}

impl InitiateDirectPurchaseHandler {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        transactions: Arc<dyn GroupTransactionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<dyn PlatformSettingsSource>,
        finalizer: Arc<JoinFinalizer>,
    ) -> Self {
        Self {
            groups,
            transactions,
            gateway,
            settings,
            finalizer,
        }
    }

    pub async fn handle(
        &self,
        cmd: InitiateDirectPurchaseCommand,
    ) -> Result<InitiateDirectPurchaseResult, JoinError> {
        let group = self
            .groups
            .find_by_id(&cmd.group_id)
            .await?
            .ok_or(JoinError::GroupNotFound(cmd.group_id))?;
        if group.status == GroupStatus::Archived {
            return Err(JoinError::GroupArchived);
        }
        if group.is_full() {
            return Err(JoinError::GroupFull);
        }
        if self
            .groups
            .find_current_membership(&group.id, &cmd.buyer_id)
            .await?
            .is_some()
        {
            return Err(JoinError::AlreadyMember);
        }

        if let Some(pending) = self
            .transactions
            .find_pending_for(&group.id, &cmd.buyer_id)
            .await?
        {
            return Ok(InitiateDirectPurchaseResult::Existing {
                transaction: pending,
                key_id: self.gateway.key_id(),
            });
        }

        let owner = match self.groups.find_owner(&group.id).await? {
            Some(owner) => owner,
            None => {
                tracing::error!(alert = "reconciliation", group_id = %group.id, "Group has no owner");
                return Err(JoinError::NoOwner {
                    group_id: group.id.to_string(),
                });
            }
        };

        let settings = self.settings.current().await?;
        let split = FeeSplit::compute(group.share_price, settings.platform_cut_percent);
        let now = Timestamp::now();
        let use_gateway = !group.is_free() && self.gateway.orders_enabled();

        if !use_gateway && !group.is_free() && !settings.allow_dev_payments {
            return Err(JoinError::gateway("Payment gateway is not configured", false));
        }

        if use_gateway {
            let mut pending =
                GroupTransaction::pending(group.id, owner.user_id, cmd.buyer_id, split, None, now);
            let order = self
                .gateway
                .create_order(CreateOrderRequest {
                    amount: split.gross,
                    currency: settings.currency.clone(),
                    receipt: format!("grp_{}", pending.id.as_uuid().simple()),
                })
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, group_id = %group.id, "Checkout order creation failed");
                    JoinError::gateway(e.message, e.retryable)
                })?;
            pending.order_id = Some(order.id.clone());
            self.transactions.insert_pending(&pending).await?;

            tracing::info!(
                transaction_id = %pending.id,
                order_id = %order.id,
                gross = %split.gross,
                "Direct purchase order created"
            );
            return Ok(InitiateDirectPurchaseResult::AwaitingPayment {
                transaction: pending,
                key_id: self.gateway.key_id(),
            });
        }

        // Dev mode or free seat: record and settle in one go.
        let pending = GroupTransaction::pending(
            group.id,
            owner.user_id,
            cmd.buyer_id,
            split,
            Some(format!("dev_ord_{}", uuid::Uuid::new_v4().simple())),
            now,
        );
        self.transactions.insert_pending(&pending).await?;
        let payment_id = if group.is_free() {
            format!("free_{}", pending.id)
        } else {
            dev_payment_id()
        };

        let finalized = self
            .finalizer
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::PendingTransaction(pending),
                payment_id,
            })
            .await?;

        Ok(InitiateDirectPurchaseResult::Joined {
            transaction: finalized.transaction,
        })
    }
}
