//! Error types for message persistence.
//!
//! Uses `thiserror` for typed variants that the service layer inspects to
//! decide between not-found, bad-request and internal-failure outcomes.

use super::domain::{MessageDomainError, MessageId};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by every [`MessageRepository`] implementation.
///
/// [`MessageRepository`]: crate::message::ports::repository::MessageRepository
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// No message is stored under the identifier.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// A message with this identifier is already stored.
    #[error("duplicate message key: {0}")]
    DuplicateKey(MessageId),

    /// A stored value could not be decoded into a message.
    #[error("stored value under '{key}' is corrupt: {reason}")]
    Corrupt {
        /// Storage key (or row identifier) holding the value.
        key: String,
        /// Decoder failure description.
        reason: String,
    },

    /// The underlying store could not be reached or rejected the request.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The caller supplied a malformed identifier, page size or cursor.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RepositoryError {
    /// Wraps a store, driver or pool failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::BackendUnavailable(Arc::new(err))
    }

    /// Creates a corruption error for the value stored under `key`.
    pub fn corrupt(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an error for a cursor the backend cannot decode.
    pub fn invalid_cursor(cursor: impl std::fmt::Display) -> Self {
        Self::InvalidInput(format!("unrecognised cursor '{cursor}'"))
    }

    /// Returns `true` for [`RepositoryError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<MessageDomainError> for RepositoryError {
    fn from(err: MessageDomainError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
