use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, GroupId, JoinIntentId, Timestamp, UserId};
use crate::domain::invite::InviteCode;
use crate::domain::join::{JoinIntent, JoinIntentStatus};
use crate::ports::{CreateIntentOutcome, JoinIntentRepository};

use super::store::not_found;
use super::InMemoryStore;

impl InMemoryStore {
    /// Applies `change` to an initiated intent; `Ok(false)` if it already moved.
    fn update_initiated(
        &self,
        id: &JoinIntentId,
        change: impl FnOnce(&mut JoinIntent) -> Result<(), crate::domain::foundation::ValidationError>,
    ) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let intent = state
            .intents
            .get_mut(id)
            .ok_or_else(|| not_found(ErrorCode::JoinIntentNotFound, "Join intent", id))?;
        if intent.status != JoinIntentStatus::Initiated {
            return Ok(false);
        }
        change(intent)?;
        Ok(true)
    }
}

#[async_trait]
impl JoinIntentRepository for InMemoryStore {
    async fn create_if_no_pending(&self, intent: &JoinIntent) -> Result<CreateIntentOutcome, DomainError> {
        let mut state = self.lock();
        if let Some(existing) = state.intents.values().find(|i| {
            i.user_id == intent.user_id && i.group_id == intent.group_id && i.is_pending()
        }) {
            return Ok(CreateIntentOutcome::Existing(existing.clone()));
        }
        state.intents.insert(intent.id, intent.clone());
        Ok(CreateIntentOutcome::Created(intent.clone()))
    }

    async fn find_by_id(&self, id: &JoinIntentId) -> Result<Option<JoinIntent>, DomainError> {
        Ok(self.lock().intents.get(id).cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<JoinIntent>, DomainError> {
        Ok(self
            .lock()
            .intents
            .values()
            .find(|i| i.order_id.as_deref() == Some(order_id))
            .cloned())
    }

    async fn find_pending(
        &self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<Option<JoinIntent>, DomainError> {
        Ok(self
            .lock()
            .intents
            .values()
            .find(|i| i.user_id == *user_id && i.group_id == *group_id && i.is_pending())
            .cloned())
    }

    async fn count_open_for_invite(&self, code: &InviteCode) -> Result<u32, DomainError> {
        Ok(self
            .lock()
            .intents
            .values()
            .filter(|i| i.invite_code == *code && i.is_pending())
            .count() as u32)
    }

    async fn set_order_id(&self, id: &JoinIntentId, order_id: &str) -> Result<(), DomainError> {
        let order_id = order_id.to_string();
        let updated = self.update_initiated(id, |intent| {
            intent.order_id = Some(order_id);
            Ok(())
        })?;
        if updated {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Join intent is no longer initiated",
            ))
        }
    }

    async fn mark_paid(
        &self,
        id: &JoinIntentId,
        payment_id: &str,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        self.update_initiated(id, |intent| intent.mark_paid(payment_id, now))
    }

    async fn mark_failed(&self, id: &JoinIntentId, now: Timestamp) -> Result<bool, DomainError> {
        self.update_initiated(id, |intent| intent.mark_failed(now))
    }

    async fn expire(&self, id: &JoinIntentId, now: Timestamp) -> Result<bool, DomainError> {
        self.update_initiated(id, |intent| intent.expire(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use crate::domain::join::PaymentMethod;

    fn intent(user: UserId, group: GroupId) -> JoinIntent {
        JoinIntent::initiate(
            InviteCode::normalize("CODE").unwrap(),
            group,
            user,
            Money::from_minor(200),
            "INR",
            PaymentMethod::Gateway,
            Timestamp::now(),
        )
    }

    #[tokio::test]
    async fn second_pending_intent_returns_first() {
        let store = InMemoryStore::new();
        let (user, group) = (UserId::new(), GroupId::new());
        let first = intent(user, group);

        let a = store.create_if_no_pending(&first).await.unwrap();
        let b = store.create_if_no_pending(&intent(user, group)).await.unwrap();

        assert!(matches!(a, CreateIntentOutcome::Created(_)));
        assert_eq!(b, CreateIntentOutcome::Existing(first));
    }

    #[tokio::test]
    async fn mark_paid_applies_once() {
        let store = InMemoryStore::new();
        let i = intent(UserId::new(), GroupId::new());
        store.create_if_no_pending(&i).await.unwrap();

        assert!(store.mark_paid(&i.id, "pay_1", Timestamp::now()).await.unwrap());
        assert!(!store.mark_paid(&i.id, "pay_2", Timestamp::now()).await.unwrap());
        assert!(!store.expire(&i.id, Timestamp::now()).await.unwrap());

        let stored = store.find_by_id(&i.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_id.as_deref(), Some("pay_1"));
    }

    #[tokio::test]
    async fn paid_intent_frees_the_pending_slot() {
        let store = InMemoryStore::new();
        let (user, group) = (UserId::new(), GroupId::new());
        let i = intent(user, group);
        store.create_if_no_pending(&i).await.unwrap();
        store.mark_failed(&i.id, Timestamp::now()).await.unwrap();

        assert!(store.find_pending(&user, &group).await.unwrap().is_none());
        let next = store.create_if_no_pending(&intent(user, group)).await.unwrap();
        assert!(matches!(next, CreateIntentOutcome::Created(_)));
    }

    #[tokio::test]
    async fn open_intents_are_counted_per_invite() {
        let store = InMemoryStore::new();
        let group = GroupId::new();
        let open = intent(UserId::new(), group);
        let settled = intent(UserId::new(), group);
        store.create_if_no_pending(&open).await.unwrap();
        store.create_if_no_pending(&settled).await.unwrap();
        store.expire(&settled.id, Timestamp::now()).await.unwrap();

        let code = InviteCode::normalize("CODE").unwrap();
        assert_eq!(store.count_open_for_invite(&code).await.unwrap(), 1);
        let other = InviteCode::normalize("OTHER").unwrap();
        assert_eq!(store.count_open_for_invite(&other).await.unwrap(), 0);
    }
}
