//! Publishing seams.

use async_trait::async_trait;
use domain::OrderCreatedEvent;

use crate::Result;
use crate::topic::TopicSpec;

/// A broker that can declare fanout topics and publish raw payloads.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Declares a topic. Idempotent for an identical spec.
    async fn declare_topic(&self, spec: &TopicSpec) -> Result<()>;

    /// Publishes a payload to every subscriber currently bound to `topic`.
    ///
    /// Returns how many subscribers the broker handed the message to;
    /// zero is a successful publish.
    async fn publish(&self, topic: &str, payload: String) -> Result<usize>;
}

/// Announces new orders to whoever is listening.
///
/// Delivery is best effort: callers are free to log and ignore a failure.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Broadcasts the event; returns the number of subscribers reached.
    async fn publish_order_created(&self, event: &OrderCreatedEvent) -> Result<usize>;
}

/// Publishes order events as JSON to one fanout topic.
#[derive(Clone)]
pub struct OrderEventPublisher<B: Broadcaster> {
    broker: B,
    topic: TopicSpec,
}

impl<B: Broadcaster> OrderEventPublisher<B> {
    /// Creates a publisher for `topic` on `broker`.
    pub fn new(broker: B, topic: TopicSpec) -> Self {
        Self { broker, topic }
    }

    /// Declares the publisher's topic; safe to call on every start.
    pub async fn declare(&self) -> Result<()> {
        self.broker.declare_topic(&self.topic).await
    }

    /// Returns the topic this publisher writes to.
    pub fn topic(&self) -> &TopicSpec {
        &self.topic
    }

    /// Returns the underlying broker.
    pub fn broker(&self) -> &B {
        &self.broker
    }
}

#[async_trait]
impl<B: Broadcaster> EventPublisher for OrderEventPublisher<B> {
    #[tracing::instrument(skip(self, event), fields(topic = %self.topic.name, order_id = %event.order.id))]
    async fn publish_order_created(&self, event: &OrderCreatedEvent) -> Result<usize> {
        let payload = event.to_json()?;
        let delivered = self.broker.publish(&self.topic.name, payload).await?;
        tracing::debug!(delivered, event_type = OrderCreatedEvent::EVENT_TYPE, "event published");
        Ok(delivered)
    }
}
