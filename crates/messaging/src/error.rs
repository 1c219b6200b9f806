use thiserror::Error;

use crate::topic::TopicSpec;

/// Errors that can occur while declaring topics or publishing.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Publishing to a topic nobody has declared.
    #[error("Topic '{0}' has not been declared")]
    UnknownTopic(String),

    /// The topic exists with different properties.
    #[error("Topic '{}' already declared as {existing:?}, requested {requested:?}", existing.name)]
    TopicMismatch {
        existing: TopicSpec,
        requested: TopicSpec,
    },

    /// The event could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The broker connection failed.
    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),

    /// The broker did not answer in time.
    #[error("Broker did not respond within {0:?}")]
    Timeout(std::time::Duration),

    /// The broker refused the message.
    #[error("Publish rejected: {0}")]
    Rejected(String),
}

/// Result type for messaging operations.
pub type Result<T> = std::result::Result<T, PublishError>;
