//! Order confirmation subscriber.

use domain::{Money, OrderCreatedEvent};
use futures_util::{Stream, StreamExt};

/// A confirmation produced for one received order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub recipient: String,
    pub order_id: String,
    pub total: Money,
}

/// Consumes `order_created` payloads and sends confirmations.
///
/// Sending is simulated with a log line. A payload that does not decode
/// is logged and skipped; it never stops the listener.
#[derive(Debug, Default)]
pub struct NotificationListener {
    sent: u64,
    skipped: u64,
}

impl NotificationListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a single payload.
    pub fn handle(&mut self, payload: &str) -> Option<Confirmation> {
        let order = match OrderCreatedEvent::from_json(payload) {
            Ok(event) => event.order,
            Err(e) => {
                tracing::error!(error = %e, "could not decode order event");
                self.skipped += 1;
                return None;
            }
        };
        let Some(total) = order.total() else {
            tracing::error!(order_id = %order.id, "order total out of range");
            self.skipped += 1;
            return None;
        };

        let confirmation = Confirmation {
            recipient: order.owner.to_string(),
            order_id: order.id.to_string(),
            total,
        };
        tracing::info!(
            recipient = %confirmation.recipient,
            order_id = %confirmation.order_id,
            total = %confirmation.total,
            "sending order confirmation email"
        );
        self.sent += 1;
        Some(confirmation)
    }

    /// Drains `payloads` until the stream ends.
    pub async fn run<S>(&mut self, mut payloads: S)
    where
        S: Stream<Item = String> + Unpin,
    {
        while let Some(payload) = payloads.next().await {
            self.handle(&payload);
        }
        tracing::info!(sent = self.sent, skipped = self.skipped, "notification stream closed");
    }

    /// Number of confirmations sent so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Number of payloads that could not be decoded.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{OrderId, VerifiedIdentity};
    use domain::{CartLine, Order};
    use futures_util::stream;

    use super::*;

    fn payload() -> (Order, String) {
        let line = CartLine::new("p-1", "A1", "Widget", 2, Money::from_cents(1000)).unwrap();
        let order = Order::new(
            OrderId::new(),
            VerifiedIdentity::new("ada@example.com"),
            vec![line],
            Utc::now(),
        )
        .unwrap();
        let json = OrderCreatedEvent::new(&order).to_json().unwrap();
        (order, json)
    }

    #[test]
    fn confirmation_addresses_the_order_owner() {
        let (order, json) = payload();
        let mut listener = NotificationListener::new();

        let confirmation = listener.handle(&json).unwrap();
        assert_eq!(confirmation.recipient, "ada@example.com");
        assert_eq!(confirmation.order_id, order.id.to_string());
        assert_eq!(confirmation.total.cents(), 2000);
        assert_eq!(listener.sent(), 1);
    }

    #[test]
    fn garbage_is_skipped() {
        let mut listener = NotificationListener::new();
        assert!(listener.handle("{not json").is_none());
        assert_eq!(listener.skipped(), 1);
        assert_eq!(listener.sent(), 0);
    }

    #[test]
    fn overflowing_total_is_skipped() {
        let (_, json) = payload();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let line = serde_json::json!({
            "productId": "p-1",
            "quantity": 1,
            "price": 5e16,
        });
        value["items"] = serde_json::json!([line.clone(), line]);

        let mut listener = NotificationListener::new();
        assert!(listener.handle(&value.to_string()).is_none());
        assert_eq!(listener.skipped(), 1);
    }

    #[tokio::test]
    async fn run_keeps_going_after_bad_payloads() {
        let (_, json) = payload();
        let mut listener = NotificationListener::new();

        listener
            .run(stream::iter(vec![
                "oops".to_string(),
                json.clone(),
                json,
            ]))
            .await;

        assert_eq!(listener.sent(), 2);
        assert_eq!(listener.skipped(), 1);
    }
}
