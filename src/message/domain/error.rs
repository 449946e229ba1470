//! Error types for message domain validation.

use thiserror::Error;

/// Errors returned while constructing or reconstructing domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageDomainError {
    /// A required identifier was the nil UUID.
    #[error("{0} must not be the nil identifier")]
    NilIdentifier(&'static str),

    /// A persisted record claims it was updated before it was created.
    #[error("updated_at {updated_at} precedes created_at {created_at}")]
    UpdatedBeforeCreated {
        /// Persisted creation timestamp.
        created_at: String,
        /// Persisted update timestamp.
        updated_at: String,
    },

    /// The requested page size is outside the accepted range.
    #[error("page size {size} is invalid, expected 1..={max}")]
    InvalidPageSize {
        /// The rejected size.
        size: u32,
        /// The largest accepted size.
        max: u32,
    },
}
