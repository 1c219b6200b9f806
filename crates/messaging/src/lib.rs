//! Broadcast of order events over a fanout topic.
//!
//! Every subscriber bound to a topic at publish time receives its own copy
//! of each message; subscribers bound later never see earlier messages.
//! Delivery is at-most-once and unacknowledged.
//!
//! - [`Broadcaster`]: topic declaration and raw publish, implemented by
//!   [`InMemoryBroadcast`] and [`RedisBroadcast`]
//! - [`EventPublisher`]: the order-level seam the checkout flow calls
//! - [`NotificationListener`]: a subscriber that confirms new orders

pub mod error;
pub mod memory;
pub mod notification;
pub mod publisher;
pub mod pubsub;
pub mod topic;

pub use error::{PublishError, Result};
pub use memory::InMemoryBroadcast;
pub use notification::{Confirmation, NotificationListener};
pub use publisher::{Broadcaster, EventPublisher, OrderEventPublisher};
pub use pubsub::RedisBroadcast;
pub use topic::{ExchangeKind, ORDERS_TOPIC, TopicSpec};
