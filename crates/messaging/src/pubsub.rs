//! Redis-backed fanout broker.
//!
//! Topics map onto Redis pub/sub channels. Redis channels need no
//! declaration, so declared topic properties are kept in the hash
//! `broadcast:topics` (field = topic name, value = JSON spec). `HSETNX`
//! makes the first declaration atomic across processes, and later
//! declarations only compare against what is stored.
//!
//! `PUBLISH` hands the message to the subscribers connected at that moment
//! and returns how many there were, which is exactly the fire-and-forget
//! fanout contract.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::publisher::Broadcaster;
use crate::topic::TopicSpec;
use crate::{PublishError, Result};

/// Hash holding every declared topic's properties.
pub const TOPICS_KEY: &str = "broadcast:topics";

/// Fanout broker over Redis pub/sub.
///
/// Cheap to clone; clones share one multiplexed connection.
#[derive(Clone)]
pub struct RedisBroadcast {
    client: Client,
    conn: ConnectionManager,
}

impl RedisBroadcast {
    /// Connects to Redis, giving up after `connect_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, the server cannot be
    /// reached, or the connection is not established in time.
    pub async fn connect(redis_url: &str, connect_timeout: Duration) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| PublishError::Timeout(connect_timeout))??;

        tracing::info!("connected to Redis broker");
        Ok(Self { client, conn })
    }

    /// Binds a new subscriber to `topic` and streams its payloads.
    ///
    /// Messages whose payload is not valid UTF-8 are logged and dropped.
    pub async fn subscribe_stream(&self, topic: &str) -> Result<BoxStream<'static, String>> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(topic).await?;

        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                match msg.get_payload::<String>() {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        tracing::error!(error = %e, "dropping undecodable message");
                        None
                    }
                }
            });
        Ok(stream.boxed())
    }

    async fn stored_spec(&self, name: &str) -> Result<Option<TopicSpec>> {
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn.hget(TOPICS_KEY, name).await?;
        stored
            .map(|json| serde_json::from_str(&json).map_err(PublishError::from))
            .transpose()
    }
}

#[async_trait]
impl Broadcaster for RedisBroadcast {
    async fn declare_topic(&self, spec: &TopicSpec) -> Result<()> {
        let mut conn = self.conn.clone();
        let json = serde_json::to_string(spec)?;

        let created: bool = conn.hset_nx(TOPICS_KEY, &spec.name, json).await?;
        if created {
            tracing::info!(topic = %spec.name, "topic declared");
            return Ok(());
        }

        match self.stored_spec(&spec.name).await? {
            Some(existing) if existing == *spec => Ok(()),
            Some(existing) => Err(PublishError::TopicMismatch {
                existing,
                requested: spec.clone(),
            }),
            // Deleted between the two calls; the next declaration recreates it.
            None => Ok(()),
        }
    }

    async fn publish(&self, topic: &str, payload: String) -> Result<usize> {
        let mut conn = self.conn.clone();

        let declared: bool = conn.hexists(TOPICS_KEY, topic).await?;
        if !declared {
            return Err(PublishError::UnknownTopic(topic.to_string()));
        }

        let receivers: i64 = conn.publish(topic, payload).await?;
        Ok(usize::try_from(receivers).unwrap_or(0))
    }
}
