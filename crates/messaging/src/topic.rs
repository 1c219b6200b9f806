//! Topic declarations.

use serde::{Deserialize, Serialize};

/// Well-known topic that carries `order_created` events.
pub const ORDERS_TOPIC: &str = "orders_exchange";

/// How a topic routes messages to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// Every bound subscriber gets a copy; no routing keys.
    Fanout,
}

/// Properties a topic is declared with.
///
/// Declaring the same spec twice is a no-op; declaring an existing name
/// with a different spec is an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicSpec {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
}

impl TopicSpec {
    /// A durable fanout topic.
    pub fn fanout(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExchangeKind::Fanout,
            durable: true,
        }
    }

    /// The topic order events are published to.
    pub fn orders() -> Self {
        Self::fanout(ORDERS_TOPIC)
    }
}
