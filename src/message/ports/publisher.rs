//! Publish sink port for new-message notifications.

use crate::message::domain::MessageProjection;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Fan-out sink for message projections.
///
/// Implementations deliver at least once. A returned error means the
/// projection may not have reached the queue.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publishes a projection of a newly created message.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when encoding, queue declaration or the
    /// publish itself fails.
    async fn publish(&self, projection: &MessageProjection) -> PublishResult<()>;
}

/// Errors returned by publish sink implementations.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    /// The projection could not be encoded.
    #[error("failed to encode projection: {0}")]
    Serialization(Arc<dyn std::error::Error + Send + Sync>),

    /// The broker connection or channel is unusable.
    #[error("queue connection unavailable: {0}")]
    Connection(Arc<dyn std::error::Error + Send + Sync>),

    /// The target queue could not be declared.
    #[error("failed to declare queue '{queue}': {source}")]
    Declare {
        /// Queue name.
        queue: String,
        /// Broker error.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The broker rejected or never confirmed the publish.
    #[error("failed to publish to queue '{queue}': {source}")]
    Publish {
        /// Queue name.
        queue: String,
        /// Broker error.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl PublishError {
    /// Wraps an encoding failure.
    pub fn serialization(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Serialization(Arc::new(err))
    }

    /// Wraps a connection or channel failure.
    pub fn connection(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Connection(Arc::new(err))
    }

    /// Wraps a queue declaration failure.
    pub fn declare(
        queue: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Declare {
            queue: queue.into(),
            source: Arc::new(err),
        }
    }

    /// Wraps a publish or confirm failure.
    pub fn publish(
        queue: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Publish {
            queue: queue.into(),
            source: Arc::new(err),
        }
    }
}
