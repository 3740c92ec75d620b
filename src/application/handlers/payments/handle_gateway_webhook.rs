//! HandleGatewayWebhookHandler - Command handler for payment gateway callbacks.
//!
//! Only a bad or missing signature is reported back as a failure. Once the
//! signature is accepted every delivery is acknowledged, and problems are
//! logged for reconciliation instead of triggering provider redelivery.

use std::sync::Arc;

use crate::domain::join::JoinError;
use crate::domain::webhook::{GatewayEvent, GatewayEventKind, SignatureVerifier, WebhookError, WebhookOutcome};
use crate::ports::{GroupTransactionRepository, JoinIntentRepository};

use crate::application::handlers::join::JoinFinalizer;

use super::capture::{CaptureMatch, CaptureRouter};

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Hex signature header value.
    pub signature: Option<String>,
}

/// Handler for gateway webhooks.
pub struct HandleGatewayWebhookHandler {
    verifier: SignatureVerifier,
    router: CaptureRouter,
}

impl HandleGatewayWebhookHandler {
    pub fn new(
        verifier: SignatureVerifier,
        intents: Arc<dyn JoinIntentRepository>,
        transactions: Arc<dyn GroupTransactionRepository>,
        finalizer: Arc<JoinFinalizer>,
    ) -> Self {
        Self {
            verifier,
            router: CaptureRouter::new(intents, transactions, finalizer),
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        if self.verifier.is_unconfigured() {
            tracing::warn!("Webhook secret not configured, delivery skipped");
            return Ok(WebhookOutcome::Unconfigured);
        }

        self.verifier
            .verify(&cmd.payload, cmd.signature.as_deref())
            .map_err(|e| {
                tracing::warn!(error = %e, "Webhook signature rejected");
                e
            })?;

        let event: GatewayEvent = serde_json::from_slice(&cmd.payload).map_err(|e| {
            tracing::warn!(error = %e, "Signed webhook body is not a gateway event");
            WebhookError::ParseError(e.to_string())
        })?;

        match event.kind() {
            GatewayEventKind::PaymentCaptured | GatewayEventKind::OrderPaid => {}
            GatewayEventKind::Other => {
                tracing::debug!(event = %event.event, "Webhook event ignored");
                return Ok(WebhookOutcome::Ignored);
            }
        }

        let Some(captured) = event.captured_payment() else {
            tracing::warn!(event = %event.event, "Capture event without order or payment id");
            return Ok(WebhookOutcome::MissingIds);
        };

        let outcome = match self.router.route(&captured).await {
            Ok(CaptureMatch::Finalized(result)) if result.replayed => WebhookOutcome::AlreadyProcessed,
            Ok(CaptureMatch::Finalized(result)) => WebhookOutcome::Processed {
                transaction_id: result.transaction.id,
            },
            Ok(CaptureMatch::AlreadyProcessed(_)) => WebhookOutcome::AlreadyProcessed,
            Ok(CaptureMatch::Unmatched) => {
                tracing::error!(
                    alert = "reconciliation",
                    order_id = %captured.order_id,
                    payment_id = %captured.payment_id,
                    "Captured payment matches no purchase"
                );
                WebhookOutcome::Unmatched
            }
            Err(e) => {
                log_failure(&e, &captured.order_id, &captured.payment_id);
                WebhookOutcome::Failed
            }
        };

        tracing::info!(
            event = %event.event,
            order_id = %captured.order_id,
            payment_id = %captured.payment_id,
            outcome = outcome.as_str(),
            "Webhook processed"
        );
        Ok(outcome)
    }
}

fn log_failure(err: &JoinError, order_id: &str, payment_id: &str) {
    if err.is_integrity_violation() {
        tracing::error!(alert = "reconciliation", error = %err, order_id, payment_id, "Webhook finalization failed");
    } else {
        tracing::error!(error = %err, order_id, payment_id, "Webhook finalization failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::application::handlers::join::{
        InitiateDirectPurchaseCommand, InitiateDirectPurchaseHandler, InitiateJoinCommand,
        InitiateJoinHandler,
    };
    use crate::domain::foundation::{Money, UserId};
    use crate::domain::join::{JoinIntent, JoinIntentStatus, PaymentMethod};
    use crate::domain::ledger::{GroupTransaction, TransactionStatus};
    use crate::domain::webhook::sign_hex;

    const SECRET: &str = "whsec_test";

    fn handler(world: &World) -> HandleGatewayWebhookHandler {
        HandleGatewayWebhookHandler::new(
            SignatureVerifier::new(SECRET),
            world.store.clone(),
            world.store.clone(),
            world.finalizer(),
        )
    }

    fn captured_body(order_id: &str, payment_id: &str) -> Vec<u8> {
        serde_json::json!({
            "event": "payment.captured",
            "payload": {"payment": {"entity": {"id": payment_id, "order_id": order_id}}}
        })
        .to_string()
        .into_bytes()
    }

    fn signed(payload: Vec<u8>) -> HandleGatewayWebhookCommand {
        let signature = sign_hex(SECRET, &payload);
        HandleGatewayWebhookCommand {
            payload,
            signature: Some(signature),
        }
    }

    async fn gateway_intent(world: &World) -> (JoinIntent, UserId) {
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);
        let invite = world.invite(&group, None);
        let result = InitiateJoinHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.store.clone(),
            world.gateway_port(),
            world.settings.clone(),
            world.finalizer(),
        )
        .handle(InitiateJoinCommand {
            code: invite.code.as_str().to_string(),
            user_id: UserId::new(),
            payment_method: PaymentMethod::Gateway,
        })
        .await
        .unwrap();
        (result.intent().clone(), owner)
    }

    async fn direct_purchase(world: &World) -> GroupTransaction {
        let group = world.group(UserId::new(), 20_000, 4);
        InitiateDirectPurchaseHandler::new(
            world.store.clone(),
            world.store.clone(),
            world.gateway_port(),
            world.settings.clone(),
            world.finalizer(),
        )
        .handle(InitiateDirectPurchaseCommand {
            group_id: group.id,
            buyer_id: UserId::new(),
        })
        .await
        .unwrap()
        .transaction()
        .clone()
    }

    // ══════════════════════════════════════════════════════════════
    // Signature gate
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn bad_signature_is_rejected_and_nothing_is_processed() {
        let world = World::new();
        let (intent, _) = gateway_intent(&world).await;
        let payload = captured_body(intent.order_id.as_deref().unwrap(), "pay_1");

        let err = handler(&world)
            .handle(HandleGatewayWebhookCommand {
                payload,
                signature: Some(sign_hex("wrong", b"x")),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert!(world.store.all_transactions().is_empty());
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let world = World::new();
        let err = handler(&world)
            .handle(HandleGatewayWebhookCommand {
                payload: b"{}".to_vec(),
                signature: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WebhookError::MissingSignature));
    }

    #[tokio::test]
    async fn unconfigured_secret_skips_delivery() {
        let world = World::new();
        let handler = HandleGatewayWebhookHandler::new(
            SignatureVerifier::new(""),
            world.store.clone(),
            world.store.clone(),
            world.finalizer(),
        );
        let outcome = handler
            .handle(HandleGatewayWebhookCommand {
                payload: b"{}".to_vec(),
                signature: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Unconfigured);
    }

    // ══════════════════════════════════════════════════════════════
    // Routing
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn capture_finalizes_matching_intent() {
        let world = World::new();
        let (intent, owner) = gateway_intent(&world).await;
        let order_id = intent.order_id.clone().unwrap();

        let outcome = handler(&world)
            .handle(signed(captured_body(&order_id, "pay_hook_1")))
            .await
            .unwrap();

        assert!(matches!(outcome, WebhookOutcome::Processed { .. }));
        let stored = world.store.intent(&intent.id).unwrap();
        assert_eq!(stored.status, JoinIntentStatus::Paid);
        assert_eq!(stored.payment_id.as_deref(), Some("pay_hook_1"));
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().withdrawable_balance,
            Money::from_minor(18_000)
        );
    }

    #[tokio::test]
    async fn redelivery_is_already_processed() {
        let world = World::new();
        let (intent, owner) = gateway_intent(&world).await;
        let order_id = intent.order_id.clone().unwrap();
        let handler = handler(&world);

        handler.handle(signed(captured_body(&order_id, "pay_2"))).await.unwrap();
        let second = handler.handle(signed(captured_body(&order_id, "pay_2"))).await.unwrap();

        assert_eq!(second, WebhookOutcome::AlreadyProcessed);
        assert_eq!(world.store.all_transactions().len(), 1);
        assert_eq!(
            world.store.earnings_of(&owner).unwrap().total_earned,
            Money::from_minor(18_000)
        );
    }

    #[tokio::test]
    async fn capture_settles_pending_direct_purchase() {
        let world = World::new();
        let pending = direct_purchase(&world).await;
        let order_id = pending.order_id.clone().unwrap();

        let outcome = handler(&world)
            .handle(signed(captured_body(&order_id, "pay_direct")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            WebhookOutcome::Processed {
                transaction_id: pending.id
            }
        );
        let rows = world.store.all_transactions();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, TransactionStatus::Paid);
        assert_eq!(rows[0].payment_id.as_deref(), Some("pay_direct"));
    }

    #[tokio::test]
    async fn unknown_order_is_unmatched_but_acknowledged() {
        let world = World::new();
        let outcome = handler(&world)
            .handle(signed(captured_body("order_nobody", "pay_x")))
            .await
            .unwrap();
        assert_eq!(outcome, WebhookOutcome::Unmatched);
    }

    #[tokio::test]
    async fn capture_without_payment_id_is_acknowledged() {
        let world = World::new();
        let payload = serde_json::json!({
            "event": "order.paid",
            "payload": {"order": {"entity": {"id": "order_1"}}}
        })
        .to_string()
        .into_bytes();

        let outcome = handler(&world).handle(signed(payload)).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::MissingIds);
    }

    #[tokio::test]
    async fn other_events_are_ignored() {
        let world = World::new();
        let payload = br#"{"event":"refund.processed"}"#.to_vec();
        let outcome = handler(&world).handle(signed(payload)).await.unwrap();
        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn signed_garbage_is_a_parse_error() {
        let world = World::new();
        let err = handler(&world).handle(signed(b"not json".to_vec())).await.unwrap_err();
        assert!(matches!(err, WebhookError::ParseError(_)));
    }
}
