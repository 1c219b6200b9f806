//! Integration events emitted for orders.

use serde::{Deserialize, Serialize};

use super::entity::Order;

/// Broadcast after an order is persisted.
///
/// Carries a full copy of the order at creation time and serializes as
/// exactly the order's JSON, so subscribers can decode it as an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub const EVENT_TYPE: &'static str = "order_created";

    /// Snapshots the given order into an event.
    pub fn new(order: &Order) -> Self {
        Self {
            order: order.clone(),
        }
    }

    /// Encodes the event payload.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an event payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderId, VerifiedIdentity};

    use super::*;
    use crate::order::{CartLine, Money};

    #[test]
    fn test_payload_is_the_order_itself() {
        let line = CartLine::new("p-1", "A1", "Widget", 2, Money::from_cents(1000)).unwrap();
        let order = Order::new(
            OrderId::new(),
            VerifiedIdentity::new("ada@example.com"),
            vec![line],
            Utc::now(),
        )
        .unwrap();

        let payload = OrderCreatedEvent::new(&order).to_json().unwrap();
        let decoded: Order = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded, order);
        assert_eq!(OrderCreatedEvent::from_json(&payload).unwrap().order, order);
    }
}
