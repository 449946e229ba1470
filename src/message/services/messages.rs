//! Service layer for message creation, retrieval and listing.

use crate::message::{
    domain::{
        ChannelId, Message, MessageDomainError, MessageDraft, MessageId, MessagePage,
        PageRequest, UserId,
    },
    error::RepositoryError,
    ports::{MessagePublisher, MessageRepository, PublishError},
};
use mockable::Clock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Request payload for creating a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMessageRequest {
    channel_id: ChannelId,
    parent_id: Option<MessageId>,
    user_id: UserId,
    message_text: String,
}

impl CreateMessageRequest {
    /// Creates a request for a top-level message.
    #[must_use]
    pub fn new(channel_id: ChannelId, user_id: UserId, message_text: impl Into<String>) -> Self {
        Self {
            channel_id,
            parent_id: None,
            user_id,
            message_text: message_text.into(),
        }
    }

    /// Makes the message a reply to `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: MessageId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets an optional parent, as decoded from a request body.
    #[must_use]
    pub const fn with_optional_parent(mut self, parent_id: Option<MessageId>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Request payload for editing a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMessageRequest {
    message_text: Option<String>,
}

impl UpdateMessageRequest {
    /// Creates a request that only refreshes the update timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets replacement text. Empty text leaves the stored text unchanged.
    #[must_use]
    pub fn with_text(mut self, message_text: impl Into<String>) -> Self {
        self.message_text = Some(message_text.into());
        self
    }
}

/// Coarse outcome classes used by transports to choose a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The addressed message does not exist.
    NotFound,
    /// The caller supplied malformed input.
    InvalidInput,
    /// A store, queue or internal failure.
    Internal,
}

/// Service-level errors for message operations.
#[derive(Debug, Clone, Error)]
pub enum MessageServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] MessageDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// The message was stored but its projection could not be published.
    #[error("message {message_id} stored but not published: {source}")]
    Publish {
        /// Identifier of the stored message.
        message_id: MessageId,
        /// Publisher failure.
        source: PublishError,
    },
}

impl MessageServiceError {
    /// Classifies the error for transport mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Repository(RepositoryError::InvalidInput(_)) => {
                ErrorKind::InvalidInput
            }
            Self::Repository(RepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::Repository(_) | Self::Publish { .. } => ErrorKind::Internal,
        }
    }
}

/// Result type for message service operations.
pub type MessageServiceResult<T> = Result<T, MessageServiceError>;

#[derive(Debug, Error)]
#[error("deadline of {0:?} elapsed")]
struct DeadlineElapsed(Duration);

/// Message orchestration service.
///
/// Works over any [`MessageRepository`]; the backend is chosen when the
/// service is constructed. Creation publishes a projection when a
/// [`MessagePublisher`] is configured. Publishing happens after the insert
/// and is not rolled back on failure, so a failed create may leave a stored
/// message behind.
pub struct MessageService<R, C>
where
    R: MessageRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    publisher: Option<Arc<dyn MessagePublisher>>,
    clock: Arc<C>,
    deadline: Option<Duration>,
}

impl<R, C> Clone for MessageService<R, C>
where
    R: MessageRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            publisher: self.publisher.clone(),
            clock: Arc::clone(&self.clock),
            deadline: self.deadline,
        }
    }
}

impl<R, C> MessageService<R, C>
where
    R: MessageRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a service with no publisher and no deadline.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            publisher: None,
            clock,
            deadline: None,
        }
    }

    /// Publishes a projection of every created message to `publisher`.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn MessagePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Bounds every repository and publisher call by `deadline`.
    ///
    /// A call that overruns is dropped and reported as
    /// [`RepositoryError::BackendUnavailable`] (or as a publish failure).
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    async fn bounded<T, E, F>(&self, call: F, on_elapsed: fn(DeadlineElapsed) -> E) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>> + Send,
    {
        match self.deadline {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(on_elapsed(DeadlineElapsed(limit)))),
            None => call.await,
        }
    }

    async fn repo<T, F>(&self, call: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>> + Send,
    {
        self.bounded(call, |elapsed| RepositoryError::backend(elapsed))
            .await
    }

    /// Creates, stores and (when configured) publishes a new message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Domain`] for nil identifiers,
    /// [`MessageServiceError::Repository`] when the insert fails, and
    /// [`MessageServiceError::Publish`] when the message was stored but the
    /// projection could not be published.
    #[tracing::instrument(skip(self, request), fields(channel_id = %request.channel_id))]
    pub async fn create(&self, request: CreateMessageRequest) -> MessageServiceResult<Message> {
        let mut draft = MessageDraft::new(request.channel_id, request.user_id, request.message_text);
        if let Some(parent_id) = request.parent_id {
            draft = draft.with_parent(parent_id);
        }
        let message = Message::new(draft, &*self.clock)?;

        self.repo(self.repository.insert(&message)).await?;
        info!(message_id = %message.id(), "message stored");

        if let Some(publisher) = &self.publisher {
            let projection = message.projection();
            let published = self
                .bounded(publisher.publish(&projection), |elapsed| {
                    PublishError::connection(elapsed)
                })
                .await;
            if let Err(source) = published {
                error!(message_id = %message.id(), error = %source, "failed to publish message");
                return Err(MessageServiceError::Publish {
                    message_id: message.id(),
                    source,
                });
            }
        }

        Ok(message)
    }

    /// Retrieves a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] with
    /// [`RepositoryError::NotFound`] when absent.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: MessageId) -> MessageServiceResult<Message> {
        Ok(self.repo(self.repository.find_by_id(id)).await?)
    }

    /// Lists all messages one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] when the cursor is not
    /// recognised or the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, page: &PageRequest) -> MessageServiceResult<MessagePage> {
        Ok(self.repo(self.repository.find_all(page)).await?)
    }

    /// Lists messages posted to `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] when the cursor is not
    /// recognised or the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_channel(
        &self,
        channel_id: ChannelId,
        page: &PageRequest,
    ) -> MessageServiceResult<MessagePage> {
        Ok(self
            .repo(self.repository.find_by_channel_id(channel_id, page))
            .await?)
    }

    /// Lists replies to `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] when the cursor is not
    /// recognised or the store fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_parent(
        &self,
        parent_id: MessageId,
        page: &PageRequest,
    ) -> MessageServiceResult<MessagePage> {
        Ok(self
            .repo(self.repository.find_by_parent_id(parent_id, page))
            .await?)
    }

    /// Applies an edit and refreshes the update timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] with
    /// [`RepositoryError::NotFound`] when the message does not exist.
    #[tracing::instrument(skip(self, request))]
    pub async fn update(
        &self,
        id: MessageId,
        request: UpdateMessageRequest,
    ) -> MessageServiceResult<Message> {
        let mut message = self.repo(self.repository.find_by_id(id)).await?;
        message.revise(request.message_text, &*self.clock);
        self.repo(self.repository.update(&message)).await?;
        Ok(message)
    }

    /// Deletes a message and its index entries.
    ///
    /// # Errors
    ///
    /// Returns [`MessageServiceError::Repository`] with
    /// [`RepositoryError::NotFound`] when the message does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: MessageId) -> MessageServiceResult<()> {
        self.repo(self.repository.delete_by_id(id)).await?;
        info!(message_id = %id, "message deleted");
        Ok(())
    }
}
