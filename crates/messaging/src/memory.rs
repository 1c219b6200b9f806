use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::{RwLock, broadcast};

use crate::publisher::Broadcaster;
use crate::topic::TopicSpec;
use crate::{PublishError, Result};

/// Buffered messages per subscriber before a slow one starts lagging.
const CHANNEL_CAPACITY: usize = 256;

struct Topic {
    spec: TopicSpec,
    sender: broadcast::Sender<String>,
}

/// In-memory fanout broker for tests and single-process runs.
///
/// Each declared topic is a `tokio::sync::broadcast` channel, which gives
/// the same semantics as a fanout exchange with transient queues: every
/// receiver alive at send time gets a copy, later receivers get nothing.
#[derive(Clone, Default)]
pub struct InMemoryBroadcast {
    topics: Arc<RwLock<HashMap<String, Topic>>>,
    fail_publishes: Arc<AtomicBool>,
}

impl InMemoryBroadcast {
    /// Creates a broker with no topics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail until switched back.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Returns how many distinct topics exist.
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }

    /// Binds a new subscriber to a declared topic.
    pub async fn subscribe(&self, topic: &str) -> Result<broadcast::Receiver<String>> {
        let topics = self.topics.read().await;
        let entry = topics
            .get(topic)
            .ok_or_else(|| PublishError::UnknownTopic(topic.to_string()))?;
        Ok(entry.sender.subscribe())
    }

    /// Binds a subscriber and exposes it as a stream of payloads.
    ///
    /// A subscriber that falls behind skips the messages it missed and
    /// carries on.
    pub async fn subscribe_stream(&self, topic: &str) -> Result<BoxStream<'static, String>> {
        let receiver = self.subscribe(topic).await?;
        let stream = stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(payload) => return Some((payload, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber lagged, messages dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(stream.boxed())
    }
}

#[async_trait]
impl Broadcaster for InMemoryBroadcast {
    async fn declare_topic(&self, spec: &TopicSpec) -> Result<()> {
        let mut topics = self.topics.write().await;
        match topics.get(&spec.name) {
            Some(existing) if existing.spec == *spec => Ok(()),
            Some(existing) => Err(PublishError::TopicMismatch {
                existing: existing.spec.clone(),
                requested: spec.clone(),
            }),
            None => {
                let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
                topics.insert(
                    spec.name.clone(),
                    Topic {
                        spec: spec.clone(),
                        sender,
                    },
                );
                Ok(())
            }
        }
    }

    async fn publish(&self, topic: &str, payload: String) -> Result<usize> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(PublishError::Rejected(
                "in-memory broker configured to fail".to_string(),
            ));
        }

        let topics = self.topics.read().await;
        let entry = topics
            .get(topic)
            .ok_or_else(|| PublishError::UnknownTopic(topic.to_string()))?;

        // A send with no receivers is a delivery to nobody, not a failure.
        Ok(entry.sender.send(payload).unwrap_or(0))
    }
}
