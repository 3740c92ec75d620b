//! InitiateJoinHandler - Command handler for starting a seat purchase from an invite.
//!
//! Every check that can reject the join runs before anything is written.
//! Free and wallet-funded joins finalize synchronously; gateway joins wait
//! for the webhook or client verification; dev joins wait for an explicit
//! confirmation.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, Timestamp, UserId};
use crate::domain::group::{Group, GroupStatus};
use crate::domain::invite::InviteError;
use crate::domain::join::{dev_payment_id, wallet_payment_id, JoinError, JoinIntent, PaymentMethod};
use crate::domain::ledger::{GroupTransaction, WalletEntry, WalletSource};
use crate::domain::settings::PlatformSettings;
use crate::ports::{
    CreateIntentOutcome, CreateOrderRequest, GroupRepository, InviteRepository,
    JoinIntentRepository, PaymentGateway, PlatformSettingsSource, WalletLedger,
};

use super::finalizer::{FinalizeJoinCommand, FinalizeSource, JoinFinalizer};
use crate::application::handlers::invite::resolve_usable_invite;

/// Command to start joining a group through an invite.
#[derive(Debug, Clone)]
pub struct InitiateJoinCommand {
    pub code: String,
    pub user_id: UserId,
    pub payment_method: PaymentMethod,
}

/// Result of starting a join.
#[derive(Debug, Clone)]
pub enum InitiateJoinResult {
    /// Paid (or free) and finalized; the user is a member.
    Joined {
        intent: JoinIntent,
        transaction: GroupTransaction,
    },
    /// Checkout order created; the client opens the gateway with `key_id`.
    AwaitingPayment { intent: JoinIntent, key_id: String },
    /// Dev intent created; confirm it to join.
    AwaitingConfirmation { intent: JoinIntent },
    /// An initiated intent already existed for this user and group.
    Existing { intent: JoinIntent, key_id: String },
}

impl InitiateJoinResult {
    pub fn intent(&self) -> &JoinIntent {
        match self {
            InitiateJoinResult::Joined { intent, .. }
            | InitiateJoinResult::AwaitingPayment { intent, .. }
            | InitiateJoinResult::AwaitingConfirmation { intent }
            | InitiateJoinResult::Existing { intent, .. } => intent,
        }
    }
}

/// Handler for starting invite joins.
pub struct InitiateJoinHandler {
    invites: Arc<dyn InviteRepository>,
    groups: Arc<dyn GroupRepository>,
    intents: Arc<dyn JoinIntentRepository>,
    wallet: Arc<dyn WalletLedger>,
    gateway: Arc<dyn PaymentGateway>,
    settings: Arc<dyn PlatformSettingsSource>,
    finalizer: Arc<JoinFinalizer>,
}

impl InitiateJoinHandler {
    pub fn new(
        invites: Arc<dyn InviteRepository>,
        groups: Arc<dyn GroupRepository>,
        intents: Arc<dyn JoinIntentRepository>,
        wallet: Arc<dyn WalletLedger>,
        gateway: Arc<dyn PaymentGateway>,
        settings: Arc<dyn PlatformSettingsSource>,
        finalizer: Arc<JoinFinalizer>,
    ) -> Self {
        Self {
            invites,
            groups,
            intents,
            wallet,
            gateway,
            settings,
            finalizer,
        }
    }

    pub async fn handle(&self, cmd: InitiateJoinCommand) -> Result<InitiateJoinResult, JoinError> {
        let settings = self.settings.current().await?;
        let now = Timestamp::now();

        // 1. Invite and group checks.
        let (invite, group) = resolve_usable_invite(
            self.invites.as_ref(),
            self.groups.as_ref(),
            &cmd.code,
            now,
        )
        .await?;
        if group.status == GroupStatus::Archived {
            return Err(JoinError::GroupArchived);
        }
        if self
            .groups
            .find_current_membership(&group.id, &cmd.user_id)
            .await?
            .is_some()
        {
            return Err(JoinError::AlreadyMember);
        }
        if group.is_full() {
            return Err(JoinError::GroupFull);
        }

        // 2. Resume an open attempt.
        if let Some(intent) = self.intents.find_pending(&cmd.user_id, &group.id).await? {
            return Ok(self.existing(intent));
        }

        // 3. Open attempts hold invite uses until they are paid, fail or expire.
        if let Some(max_uses) = invite.max_uses {
            let open = self.intents.count_open_for_invite(&invite.code).await?;
            if invite.uses_count.saturating_add(open) >= max_uses {
                return Err(JoinError::Invite(InviteError::MaxUses));
            }
        }

        let method = self.effective_method(cmd.payment_method, &group, &settings)?;
        let intent = JoinIntent::initiate(
            invite.code.clone(),
            group.id,
            cmd.user_id,
            group.share_price,
            settings.currency.clone(),
            method,
            now,
        );

        if intent.is_free() {
            return self.join_free(intent).await;
        }

        match method {
            PaymentMethod::Wallet => self.join_with_wallet(intent, &group.name).await,
            PaymentMethod::Gateway => self.start_checkout(intent).await,
            PaymentMethod::Dev => {
                let intent = intent.with_payment_id(dev_payment_id());
                match self.intents.create_if_no_pending(&intent).await? {
                    CreateIntentOutcome::Created(intent) => {
                        tracing::info!(intent_id = %intent.id, group_id = %intent.group_id, "Dev join intent created");
                        Ok(InitiateJoinResult::AwaitingConfirmation { intent })
                    }
                    CreateIntentOutcome::Existing(intent) => Ok(self.existing(intent)),
                }
            }
        }
    }

    /// Gateway joins fall back to dev when no credentials are configured.
    fn effective_method(
        &self,
        requested: PaymentMethod,
        group: &Group,
        settings: &PlatformSettings,
    ) -> Result<PaymentMethod, JoinError> {
        if group.is_free() {
            return Ok(requested);
        }
        match requested {
            PaymentMethod::Dev if !settings.allow_dev_payments => Err(JoinError::DevPaymentsDisabled),
            PaymentMethod::Gateway if !self.gateway.orders_enabled() => {
                if settings.allow_dev_payments {
                    Ok(PaymentMethod::Dev)
                } else {
                    Err(JoinError::gateway("Payment gateway is not configured", false))
                }
            }
            method => Ok(method),
        }
    }

    fn existing(&self, intent: JoinIntent) -> InitiateJoinResult {
        tracing::debug!(intent_id = %intent.id, "Returning open join intent");
        InitiateJoinResult::Existing {
            intent,
            key_id: self.gateway.key_id(),
        }
    }

    async fn join_free(&self, intent: JoinIntent) -> Result<InitiateJoinResult, JoinError> {
        let intent = match self.intents.create_if_no_pending(&intent).await? {
            CreateIntentOutcome::Created(intent) => intent,
            CreateIntentOutcome::Existing(intent) => return Ok(self.existing(intent)),
        };
        let payment_id = intent.free_payment_id();
        self.pay_and_finalize(intent, payment_id).await
    }

    async fn join_with_wallet(
        &self,
        intent: JoinIntent,
        group_name: &str,
    ) -> Result<InitiateJoinResult, JoinError> {
        let intent = match self.intents.create_if_no_pending(&intent).await? {
            CreateIntentOutcome::Created(intent) => intent,
            CreateIntentOutcome::Existing(intent) => return Ok(self.existing(intent)),
        };

        let entry = WalletEntry::new(
            WalletSource::Purchase,
            format!("Seat purchase for group \"{}\"", group_name),
        )
        .with_reference(intent.id.to_string())
        .with_idempotency_key(intent.wallet_debit_key());

        let debit = match self.wallet.debit(&intent.user_id, intent.amount, entry).await {
            Ok(debit) => debit,
            Err(e) => {
                if e.code == ErrorCode::InsufficientFunds {
                    self.intents.mark_failed(&intent.id, Timestamp::now()).await?;
                    tracing::info!(intent_id = %intent.id, amount = %intent.amount, "Wallet join declined");
                }
                return Err(e.into());
            }
        };

        let payment_id = wallet_payment_id(&debit.transaction().id);
        self.pay_and_finalize(intent, payment_id).await
    }

    async fn start_checkout(&self, intent: JoinIntent) -> Result<InitiateJoinResult, JoinError> {
        let order = self
            .gateway
            .create_order(CreateOrderRequest {
                amount: intent.amount,
                currency: intent.currency.clone(),
                receipt: format!("join_{}", intent.id.as_uuid().simple()),
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, intent_id = %intent.id, "Checkout order creation failed");
                JoinError::gateway(e.message, e.retryable)
            })?;

        let intent = intent.with_order_id(order.id.clone());
        match self.intents.create_if_no_pending(&intent).await? {
            CreateIntentOutcome::Created(intent) => {
                tracing::info!(
                    intent_id = %intent.id,
                    order_id = %order.id,
                    gross = %intent.amount,
                    "Gateway join intent created"
                );
                Ok(InitiateJoinResult::AwaitingPayment {
                    intent,
                    key_id: self.gateway.key_id(),
                })
            }
            CreateIntentOutcome::Existing(intent) => Ok(self.existing(intent)),
        }
    }

    async fn pay_and_finalize(
        &self,
        mut intent: JoinIntent,
        payment_id: String,
    ) -> Result<InitiateJoinResult, JoinError> {
        let now = Timestamp::now();
        if !self.intents.mark_paid(&intent.id, &payment_id, now).await? {
            tracing::warn!(intent_id = %intent.id, "Intent moved before it was marked paid");
        }
        intent
            .mark_paid(payment_id.clone(), now)
            .map_err(|_| JoinError::invalid_state(intent.status.as_str(), "mark paid"))?;

        let finalized = self
            .finalizer
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(intent.clone()),
                payment_id,
            })
            .await?;

        Ok(InitiateJoinResult::Joined {
            intent,
            transaction: finalized.transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::domain::foundation::Money;
    use crate::domain::join::JoinIntentStatus;
    use crate::ports::PaymentError;

    fn handler(world: &World) -> InitiateJoinHandler {
        InitiateJoinHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.gateway_port(),
            world.settings.clone(),
            world.finalizer(),
        )
    }

    fn cmd(code: &str, user_id: UserId, payment_method: PaymentMethod) -> InitiateJoinCommand {
        InitiateJoinCommand {
            code: code.to_string(),
            user_id,
            payment_method,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Gateway
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn gateway_join_creates_order_and_intent() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, None);
        let buyer = UserId::new();

        let result = handler(&world)
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Gateway))
            .await
            .unwrap();

        match result {
            InitiateJoinResult::AwaitingPayment { intent, key_id } => {
                assert!(intent.order_id.as_deref().unwrap().starts_with("order_mock_"));
                assert_eq!(intent.amount, Money::from_minor(20_000));
                assert_eq!(intent.status, JoinIntentStatus::Initiated);
                assert_eq!(key_id, "rzp_test_mock");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(world.store.members_of(&group.id).iter().all(|m| m.user_id != buyer));
    }

    #[tokio::test]
    async fn repeat_initiate_returns_open_intent_without_new_order() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, None);
        let buyer = UserId::new();
        let handler = handler(&world);

        let first = handler
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Gateway))
            .await
            .unwrap();
        let second = handler
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Gateway))
            .await
            .unwrap();

        assert!(matches!(second, InitiateJoinResult::Existing { .. }));
        assert_eq!(first.intent().id, second.intent().id);
        assert_eq!(world.gateway.call_count("create_order"), 1);
    }

    #[tokio::test]
    async fn order_failure_persists_nothing() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, None);
        let buyer = UserId::new();
        world.gateway.set_error(PaymentError::network("connection refused"));

        let err = handler(&world)
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Gateway))
            .await
            .unwrap_err();

        assert!(matches!(err, JoinError::Gateway { retryable: true, .. }));
        assert!(world.store.find_pending(&buyer, &group.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unconfigured_gateway_falls_back_to_dev() {
        let world = World::new();
        world.gateway.set_orders_enabled(false);
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, None);

        let result = handler(&world)
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Gateway))
            .await
            .unwrap();

        match result {
            InitiateJoinResult::AwaitingConfirmation { intent } => {
                assert_eq!(intent.payment_method, PaymentMethod::Dev);
                assert!(intent.payment_id.as_deref().unwrap().starts_with("dev_"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Rejections
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn existing_member_is_rejected() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);

        let err = handler(&world)
            .handle(cmd(invite.code.as_str(), owner, PaymentMethod::Gateway))
            .await
            .unwrap_err();

        assert_eq!(err, JoinError::AlreadyMember);
        assert!(!world.gateway.was_called("create_order"));
    }

    #[tokio::test]
    async fn open_checkouts_hold_invite_uses() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, Some(1));
        let handler = handler(&world);

        handler
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Gateway))
            .await
            .unwrap();
        let err = handler
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Gateway))
            .await
            .unwrap_err();

        assert_eq!(err, JoinError::Invite(InviteError::MaxUses));
        assert_eq!(world.gateway.call_count("create_order"), 1);
    }

    #[tokio::test]
    async fn expired_checkout_releases_its_invite_use() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, Some(1));
        let handler = handler(&world);
        let first = handler
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Gateway))
            .await
            .unwrap();
        assert!(world.store.expire(&first.intent().id, Timestamp::now()).await.unwrap());

        let second = handler
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Gateway))
            .await
            .unwrap();

        assert!(matches!(second, InitiateJoinResult::AwaitingPayment { .. }));
    }

    #[tokio::test]
    async fn full_group_is_rejected() {
        let world = World::new();
        let mut group = world.group(UserId::new(), 20_000, 2);
        group.member_count = 2;
        GroupRepository::save(&*world.store, &group).await.unwrap();
        let invite = world.invite(&group, None);

        let err = handler(&world)
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Gateway))
            .await
            .unwrap_err();

        assert_eq!(err, JoinError::GroupFull);
    }

    #[tokio::test]
    async fn dev_join_rejected_when_disabled() {
        let world = World::new();
        world.update_settings(|s| s.allow_dev_payments = false);
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, None);

        let err = handler(&world)
            .handle(cmd(invite.code.as_str(), UserId::new(), PaymentMethod::Dev))
            .await
            .unwrap_err();

        assert_eq!(err, JoinError::DevPaymentsDisabled);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Synchronous joins
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn free_group_joins_immediately() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 0, 4);
        let invite = world.invite(&group, None);
        let buyer = UserId::new();

        let result = handler(&world)
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Gateway))
            .await
            .unwrap();

        match result {
            InitiateJoinResult::Joined { intent, transaction } => {
                assert_eq!(intent.status, JoinIntentStatus::Paid);
                assert_eq!(transaction.payment_id, Some(format!("free_{}", intent.id)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!world.gateway.was_called("create_order"));
        assert_eq!(world.store.members_of(&group.id).len(), 2);
        assert!(world.store.earnings_of(&owner).is_none());
    }

    #[tokio::test]
    async fn wallet_join_debits_and_finalizes() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let buyer = UserId::new();
        world.fund_wallet(buyer, 50_000).await;

        let result = handler(&world)
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Wallet))
            .await
            .unwrap();

        let InitiateJoinResult::Joined { transaction, .. } = result else {
            panic!("wallet join should finalize");
        };
        assert!(transaction.payment_id.unwrap().starts_with("wallet_"));
        assert_eq!(world.store.wallet_balance(&buyer), Money::from_minor(30_000));
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(18_000)
        );
    }

    #[tokio::test]
    async fn short_wallet_fails_intent_and_allows_retry() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);
        let invite = world.invite(&group, None);
        let buyer = UserId::new();
        world.fund_wallet(buyer, 5_000).await;
        let handler = handler(&world);

        let err = handler
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Wallet))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            JoinError::InsufficientFunds {
                available: Money::from_minor(5_000),
                requested: Money::from_minor(20_000),
            }
        );
        assert_eq!(world.store.wallet_balance(&buyer), Money::from_minor(5_000));
        assert!(world.store.find_pending(&buyer, &group.id).await.unwrap().is_none());

        world.fund_wallet(buyer, 20_000).await;
        let retry = handler
            .handle(cmd(invite.code.as_str(), buyer, PaymentMethod::Wallet))
            .await
            .unwrap();
        assert!(matches!(retry, InitiateJoinResult::Joined { .. }));
    }
}
