//! ConfirmDevJoinHandler - Command handler for confirming a dev-mode join.
//!
//! Stands in for the gateway callback in environments without payment
//! credentials. Disabled whenever dev payments are off.

use std::sync::Arc;

use crate::domain::foundation::{JoinIntentId, Timestamp, UserId};
use crate::domain::invite::{InviteError, InviteStatus};
use crate::domain::join::{dev_payment_id, JoinError, JoinIntent, JoinIntentStatus};
use crate::domain::ledger::GroupTransaction;
use crate::ports::{
    GroupTransactionRepository, InviteRepository, JoinIntentRepository, PlatformSettingsSource,
};

use super::finalizer::{FinalizeJoinCommand, FinalizeSource, JoinFinalizer};

/// Command to confirm a dev join intent.
#[derive(Debug, Clone)]
pub struct ConfirmDevJoinCommand {
    pub intent_id: JoinIntentId,
    pub user_id: UserId,
}

/// Result of a dev confirmation.
#[derive(Debug, Clone)]
pub struct ConfirmDevJoinResult {
    pub intent: JoinIntent,
    pub transaction: GroupTransaction,
    /// True when the intent had already been confirmed.
    pub replayed: bool,
}

/// Handler for dev join confirmations.
pub struct ConfirmDevJoinHandler {
    intents: Arc<dyn JoinIntentRepository>,
    invites: Arc<dyn InviteRepository>,
    transactions: Arc<dyn GroupTransactionRepository>,
    settings: Arc<dyn PlatformSettingsSource>,
    finalizer: Arc<JoinFinalizer>,
}

impl ConfirmDevJoinHandler {
    pub fn new(
        intents: Arc<dyn JoinIntentRepository>,
        invites: Arc<dyn InviteRepository>,
        transactions: Arc<dyn GroupTransactionRepository>,
        settings: Arc<dyn PlatformSettingsSource>,
        finalizer: Arc<JoinFinalizer>,
    ) -> Self {
        Self {
            intents,
            invites,
            transactions,
            settings,
            finalizer,
        }
    }

    pub async fn handle(&self, cmd: ConfirmDevJoinCommand) -> Result<ConfirmDevJoinResult, JoinError> {
        if !self.settings.current().await?.allow_dev_payments {
            return Err(JoinError::DevPaymentsDisabled);
        }

        let mut intent = self
            .intents
            .find_by_id(&cmd.intent_id)
            .await?
            .ok_or(JoinError::IntentNotFound(cmd.intent_id))?;
        if intent.user_id != cmd.user_id {
            return Err(JoinError::Forbidden);
        }

        match intent.status {
            JoinIntentStatus::Initiated => {}
            JoinIntentStatus::Paid => return self.replay(intent).await,
            other => return Err(JoinError::invalid_state(other.as_str(), "confirm")),
        }

        let invite_active = self
            .invites
            .find_by_code(&intent.invite_code)
            .await?
            .is_some_and(|invite| invite.status == InviteStatus::Active);
        if !invite_active {
            return Err(InviteError::Disabled.into());
        }

        let payment_id = intent.payment_id.clone().unwrap_or_else(dev_payment_id);
        let now = Timestamp::now();
        if !self.intents.mark_paid(&intent.id, &payment_id, now).await? {
            // Someone else moved it first; report whatever it became.
            let current = self
                .intents
                .find_by_id(&intent.id)
                .await?
                .ok_or(JoinError::IntentNotFound(intent.id))?;
            return match current.status {
                JoinIntentStatus::Paid => self.replay(current).await,
                other => Err(JoinError::invalid_state(other.as_str(), "confirm")),
            };
        }
        intent
            .mark_paid(payment_id.clone(), now)
            .map_err(|_| JoinError::invalid_state(intent.status.as_str(), "confirm"))?;

        let finalized = self
            .finalizer
            .handle(FinalizeJoinCommand {
                source: FinalizeSource::Intent(intent.clone()),
                payment_id,
            })
            .await?;

        tracing::info!(intent_id = %intent.id, group_id = %intent.group_id, "Dev join confirmed");
        Ok(ConfirmDevJoinResult {
            intent,
            transaction: finalized.transaction,
            replayed: finalized.replayed,
        })
    }

    async fn replay(&self, intent: JoinIntent) -> Result<ConfirmDevJoinResult, JoinError> {
        let payment_id = intent
            .payment_id
            .clone()
            .ok_or_else(|| JoinError::infrastructure("paid intent has no payment id"))?;

        // Paid but not yet finalized (crash between the two); finish it now.
        let transaction = match self.transactions.find_by_payment_id(&payment_id).await? {
            Some(tx) => tx,
            None => {
                self.finalizer
                    .handle(FinalizeJoinCommand {
                        source: FinalizeSource::Intent(intent.clone()),
                        payment_id,
                    })
                    .await?
                    .transaction
            }
        };

        Ok(ConfirmDevJoinResult {
            intent,
            transaction,
            replayed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::application::handlers::join::{InitiateJoinCommand, InitiateJoinHandler};
    use crate::domain::foundation::Money;
    use crate::domain::join::PaymentMethod;

    fn handler(world: &World) -> ConfirmDevJoinHandler {
        ConfirmDevJoinHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.settings.clone(),
            world.finalizer(),
        )
    }

    async fn dev_intent(world: &World, buyer: UserId) -> (JoinIntent, UserId) {
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let initiate = InitiateJoinHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.gateway_port(),
            world.settings.clone(),
            world.finalizer(),
        );
        let result = initiate
            .handle(InitiateJoinCommand {
                code: invite.code.as_str().to_string(),
                user_id: buyer,
                payment_method: PaymentMethod::Dev,
            })
            .await
            .unwrap();
        (result.intent().clone(), owner)
    }

    #[tokio::test]
    async fn confirms_and_finalizes_with_the_dev_payment_id() {
        let world = World::new();
        let buyer = UserId::new();
        let (intent, owner) = dev_intent(&world, buyer).await;

        let result = handler(&world)
            .handle(ConfirmDevJoinCommand {
                intent_id: intent.id,
                user_id: buyer,
            })
            .await
            .unwrap();

        assert!(!result.replayed);
        assert_eq!(result.intent.status, JoinIntentStatus::Paid);
        assert_eq!(result.transaction.payment_id, intent.payment_id);
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(18_000)
        );
    }

    #[tokio::test]
    async fn second_confirm_is_a_replay() {
        let world = World::new();
        let buyer = UserId::new();
        let (intent, _) = dev_intent(&world, buyer).await;
        let handler = handler(&world);
        let cmd = ConfirmDevJoinCommand {
            intent_id: intent.id,
            user_id: buyer,
        };

        let first = handler.handle(cmd.clone()).await.unwrap();
        let second = handler.handle(cmd).await.unwrap();

        assert!(second.replayed);
        assert_eq!(first.transaction.id, second.transaction.id);
        assert_eq!(world.store.all_transactions().len(), 1);
    }

    #[tokio::test]
    async fn other_users_cannot_confirm() {
        let world = World::new();
        let (intent, _) = dev_intent(&world, UserId::new()).await;

        let err = handler(&world)
            .handle(ConfirmDevJoinCommand {
                intent_id: intent.id,
                user_id: UserId::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, JoinError::Forbidden);
    }

    #[tokio::test]
    async fn refused_when_dev_payments_are_off() {
        let world = World::new();
        let buyer = UserId::new();
        let (intent, _) = dev_intent(&world, buyer).await;
        world.update_settings(|s| s.allow_dev_payments = false);

        let err = handler(&world)
            .handle(ConfirmDevJoinCommand {
                intent_id: intent.id,
                user_id: buyer,
            })
            .await
            .unwrap_err();
        assert_eq!(err, JoinError::DevPaymentsDisabled);
        assert!(world.store.all_transactions().is_empty());
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found() {
        let world = World::new();
        let id = JoinIntentId::new();
        let err = handler(&world)
            .handle(ConfirmDevJoinCommand {
                intent_id: id,
                user_id: UserId::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, JoinError::IntentNotFound(id));
    }
}
