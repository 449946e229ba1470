//! Repository port for message persistence.
//!
//! Defines the one interface both storage backends implement, so the
//! service layer is written once and the backend is chosen when the
//! application is composed.

use crate::message::{
    domain::{ChannelId, Message, MessageId, MessagePage, PageRequest},
    error::RepositoryError,
};
use async_trait::async_trait;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Port for message persistence operations.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - Message identifiers are unique and a duplicate insert has no side
///   effects
/// - Writes that touch a record and its indexes are applied all-or-nothing
/// - `update` and `delete_by_id` report [`RepositoryError::NotFound`] when
///   nothing matched, rather than succeeding silently
/// - Listing may be weakly consistent under concurrent writes
/// - Dropping a returned future abandons the call without retrying
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stores a new message.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateKey`] when the identifier is
    /// already stored.
    async fn insert(&self, message: &Message) -> RepositoryResult<()>;

    /// Retrieves a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when absent and
    /// [`RepositoryError::Corrupt`] when the stored value cannot be decoded.
    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Message>;

    /// Replaces the stored text and update timestamp of an existing message.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no message matched.
    async fn update(&self, message: &Message) -> RepositoryResult<()>;

    /// Removes a message and every index entry pointing at it.
    ///
    /// A stored record that no longer decodes is still removed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no message matched.
    async fn delete_by_id(&self, id: MessageId) -> RepositoryResult<()>;

    /// Lists stored messages one page at a time.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidInput`] for a cursor this backend
    /// did not issue.
    async fn find_all(&self, page: &PageRequest) -> RepositoryResult<MessagePage>;

    /// Lists messages posted to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidInput`] for a cursor this backend
    /// did not issue.
    async fn find_by_channel_id(
        &self,
        channel_id: ChannelId,
        page: &PageRequest,
    ) -> RepositoryResult<MessagePage>;

    /// Lists replies to a parent message.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidInput`] for a cursor this backend
    /// did not issue.
    async fn find_by_parent_id(
        &self,
        parent_id: MessageId,
        page: &PageRequest,
    ) -> RepositoryResult<MessagePage>;
}
