//! Cursor-based pagination types shared by every repository backend.
//!
//! A [`Cursor`] is opaque to callers: each backend encodes its own position
//! (a scan cursor for key-value stores, the last ordering key for relational
//! stores) and rejects tokens it cannot decode. A page whose `next` cursor is
//! `None` is the last one.

use super::{Message, MessageDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page size used when the caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Opaque continuation token returned with a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request for one page of messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    size: u32,
    cursor: Option<Cursor>,
}

impl PageRequest {
    /// Requests the first page with up to `size` messages.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidPageSize`] when `size` is zero or
    /// exceeds [`MAX_PAGE_SIZE`].
    pub fn first(size: u32) -> Result<Self, MessageDomainError> {
        Self::new(size, None)
    }

    /// Requests up to `size` messages, resuming from `cursor` when present.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::InvalidPageSize`] when `size` is zero or
    /// exceeds [`MAX_PAGE_SIZE`].
    pub fn new(size: u32, cursor: Option<Cursor>) -> Result<Self, MessageDomainError> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(MessageDomainError::InvalidPageSize {
                size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self { size, cursor })
    }

    /// Returns a request for the page following `next`, keeping the size.
    #[must_use]
    pub fn resume(&self, next: Cursor) -> Self {
        Self {
            size: self.size,
            cursor: Some(next),
        }
    }

    /// Returns the maximum number of messages requested.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns the cursor to resume from, if any.
    #[must_use]
    pub const fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }
}

/// One page of messages plus the cursor for the next page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePage {
    messages: Vec<Message>,
    next: Option<Cursor>,
}

impl MessagePage {
    /// Creates a page.
    #[must_use]
    pub const fn new(messages: Vec<Message>, next: Option<Cursor>) -> Self {
        Self { messages, next }
    }

    /// Creates an empty, terminal page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            messages: Vec::new(),
            next: None,
        }
    }

    /// Returns the messages on this page.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the cursor for the following page, or `None` on the last page.
    #[must_use]
    pub const fn next(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    /// Returns `true` when no further page exists.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next.is_none()
    }

    /// Splits the page into its messages and continuation cursor.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Message>, Option<Cursor>) {
        (self.messages, self.next)
    }
}
