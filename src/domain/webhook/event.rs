//! Gateway webhook event payloads.
//!
//! Only the fields needed to match a capture to a purchase are read; the rest
//! of the payload is ignored.

use serde::Deserialize;

/// Envelope of a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    #[serde(default)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
    #[serde(default)]
    pub order: Option<EntityWrapper<OrderEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderEntity {
    #[serde(default)]
    pub id: Option<String>,
}

/// Event types the ingestor acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayEventKind {
    PaymentCaptured,
    OrderPaid,
    Other,
}

/// Order and payment ids extracted from a capture event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPayment {
    pub order_id: String,
    pub payment_id: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl GatewayEvent {
    pub fn kind(&self) -> GatewayEventKind {
        match self.event.as_str() {
            "payment.captured" => GatewayEventKind::PaymentCaptured,
            "order.paid" => GatewayEventKind::OrderPaid,
            _ => GatewayEventKind::Other,
        }
    }

    /// Extracts the ids of a captured payment.
    ///
    /// The order id comes from the payment entity, falling back to the order
    /// entity. Returns `None` if either id is missing.
    pub fn captured_payment(&self) -> Option<CapturedPayment> {
        let payment = self.payload.payment.as_ref().map(|w| &w.entity);
        let order_id = payment
            .and_then(|p| present(&p.order_id))
            .or_else(|| {
                self.payload
                    .order
                    .as_ref()
                    .and_then(|w| present(&w.entity.id))
            })?;
        let payment_id = payment.and_then(|p| present(&p.id))?;
        Some(CapturedPayment {
            order_id: order_id.to_string(),
            payment_id: payment_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GatewayEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn payment_captured_yields_both_ids() {
        let event = parse(
            r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1","order_id":"order_1","amount":20000}}}}"#,
        );
        assert_eq!(event.kind(), GatewayEventKind::PaymentCaptured);
        assert_eq!(
            event.captured_payment(),
            Some(CapturedPayment {
                order_id: "order_1".to_string(),
                payment_id: "pay_1".to_string(),
            })
        );
    }

    #[test]
    fn order_paid_falls_back_to_order_entity() {
        let event = parse(
            r#"{"event":"order.paid","payload":{"payment":{"entity":{"id":"pay_2"}},"order":{"entity":{"id":"order_2"}}}}"#,
        );
        assert_eq!(event.kind(), GatewayEventKind::OrderPaid);
        let ids = event.captured_payment().unwrap();
        assert_eq!(ids.order_id, "order_2");
        assert_eq!(ids.payment_id, "pay_2");
    }

    #[test]
    fn missing_payment_id_yields_none() {
        let event = parse(r#"{"event":"order.paid","payload":{"order":{"entity":{"id":"order_3"}}}}"#);
        assert!(event.captured_payment().is_none());
    }

    #[test]
    fn unknown_events_are_other() {
        let event = parse(r#"{"event":"refund.created"}"#);
        assert_eq!(event.kind(), GatewayEventKind::Other);
    }
}
