//! In-memory publish sink that records projections.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::message::{
    domain::MessageProjection,
    ports::publisher::{MessagePublisher, PublishError, PublishResult},
};

/// [`MessagePublisher`] that keeps every published projection in memory.
///
/// Used by tests to observe fan-out and by the in-memory runtime where no
/// broker is configured.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<MessageProjection>>>,
}

impl RecordingPublisher {
    /// Creates a publisher with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every projection published so far, oldest first.
    ///
    /// Returns an empty list if the internal lock is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<MessageProjection> {
        self.published
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, projection: &MessageProjection) -> PublishResult<()> {
        let mut guard = self.published.lock().map_err(|err| {
            PublishError::connection(std::io::Error::other(err.to_string()))
        })?;
        guard.push(projection.clone());
        Ok(())
    }
}
