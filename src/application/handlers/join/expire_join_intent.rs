//! ExpireJoinIntentHandler - Command handler for abandoning a stale join attempt.

use std::sync::Arc;

use crate::domain::foundation::{JoinIntentId, Timestamp, UserId};
use crate::domain::join::{JoinError, JoinIntent, JoinIntentStatus};
use crate::ports::JoinIntentRepository;

/// Command to expire an initiated intent.
#[derive(Debug, Clone)]
pub struct ExpireJoinIntentCommand {
    pub intent_id: JoinIntentId,
    /// When set, only this user's intent may be expired.
    pub requested_by: Option<UserId>,
}

#[derive(Debug, Clone)]
pub struct ExpireJoinIntentResult {
    pub intent: JoinIntent,
}

/// Handler for expiring join intents.
pub struct ExpireJoinIntentHandler {
    intents: Arc<dyn JoinIntentRepository>,
}

impl ExpireJoinIntentHandler {
    pub fn new(intents: Arc<dyn JoinIntentRepository>) -> Self {
        Self { intents }
    }

    pub async fn handle(&self, cmd: ExpireJoinIntentCommand) -> Result<ExpireJoinIntentResult, JoinError> {
        let mut intent = self
            .intents
            .find_by_id(&cmd.intent_id)
            .await?
            .ok_or(JoinError::IntentNotFound(cmd.intent_id))?;
        if cmd.requested_by.is_some_and(|user| user != intent.user_id) {
            return Err(JoinError::Forbidden);
        }

        let now = Timestamp::now();
        if intent.status != JoinIntentStatus::Initiated
            || !self.intents.expire(&intent.id, now).await?
        {
            let current = self
                .intents
                .find_by_id(&intent.id)
                .await?
                .map_or(intent.status, |i| i.status);
            return Err(JoinError::invalid_state(current.as_str(), "expire"));
        }
        intent
            .expire(now)
            .map_err(|_| JoinError::invalid_state(intent.status.as_str(), "expire"))?;

        tracing::info!(intent_id = %intent.id, group_id = %intent.group_id, "Join intent expired");
        Ok(ExpireJoinIntentResult { intent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{GroupId, Money};
    use crate::domain::invite::InviteCode;
    use crate::domain::join::PaymentMethod;
    use crate::adapters::memory::InMemoryStore;

    async fn seeded(store: &InMemoryStore, user: UserId) -> JoinIntent {
        let intent = JoinIntent::initiate(
            InviteCode::generate(),
            GroupId::new(),
            user,
            Money::from_minor(20_000),
            "INR",
            PaymentMethod::Gateway,
            Timestamp::now(),
        );
        store.create_if_no_pending(&intent).await.unwrap();
        intent
    }

    #[tokio::test]
    async fn expiring_frees_the_pending_slot() {
        let store = Arc::new(InMemoryStore::new());
        let user = UserId::new();
        let intent = seeded(&store, user).await;
        let handler = ExpireJoinIntentHandler::new(store.clone());

        let result = handler
            .handle(ExpireJoinIntentCommand {
                intent_id: intent.id,
                requested_by: Some(user),
            })
            .await
            .unwrap();

        assert_eq!(result.intent.status, JoinIntentStatus::Expired);
        assert!(store.find_pending(&user, &intent.group_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn paid_intent_cannot_expire() {
        let store = Arc::new(InMemoryStore::new());
        let user = UserId::new();
        let intent = seeded(&store, user).await;
        store.mark_paid(&intent.id, "pay_1", Timestamp::now()).await.unwrap();

        let err = ExpireJoinIntentHandler::new(store.clone())
            .handle(ExpireJoinIntentCommand {
                intent_id: intent.id,
                requested_by: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, JoinError::invalid_state("paid", "expire"));
    }

    #[tokio::test]
    async fn only_the_owner_of_the_intent_may_expire_it() {
        let store = Arc::new(InMemoryStore::new());
        let intent = seeded(&store, UserId::new()).await;

        let err = ExpireJoinIntentHandler::new(store.clone())
            .handle(ExpireJoinIntentCommand {
                intent_id: intent.id,
                requested_by: Some(UserId::new()),
            })
            .await
            .unwrap_err();

        assert_eq!(err, JoinError::Forbidden);
    }
}
