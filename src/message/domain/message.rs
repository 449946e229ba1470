//! The Message aggregate root representing one chat message.
//!
//! A message belongs to exactly one channel, may reply to a parent message,
//! and carries mutable text plus creation and update timestamps.

use super::{ChannelId, MessageDomainError, MessageId, MessageProjection, UserId};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Fractional-second digits kept on every timestamp.
///
/// `PostgreSQL` stores `timestamptz` with microsecond resolution, so values
/// are truncated up front to make store round-trips exact.
const TIMESTAMP_PRECISION: u16 = 6;

fn now(clock: &impl Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(TIMESTAMP_PRECISION)
}

/// Caller-supplied fields for a message that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    channel_id: ChannelId,
    parent_id: Option<MessageId>,
    user_id: UserId,
    message_text: String,
}

impl MessageDraft {
    /// Creates a top-level draft in `channel_id` authored by `user_id`.
    #[must_use]
    pub fn new(channel_id: ChannelId, user_id: UserId, message_text: impl Into<String>) -> Self {
        Self {
            channel_id,
            parent_id: None,
            user_id,
            message_text: message_text.into(),
        }
    }

    /// Marks the draft as a reply to `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: MessageId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Field values for reconstructing a message from storage.
///
/// This is also the shape of the JSON record, so decoding a stored value
/// always passes through [`Message::from_persisted`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistedMessageData {
    /// Stored message identifier.
    pub message_id: MessageId,
    /// Owning channel.
    pub channel_id: ChannelId,
    /// Optional parent message.
    #[serde(default)]
    pub parent_id: Option<MessageId>,
    /// Author.
    pub user_id: UserId,
    /// Message text.
    #[serde(rename = "message")]
    pub message_text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A chat message.
///
/// # Invariants
///
/// - `message_id`, `channel_id`, `parent_id`, `user_id` and `created_at`
///   never change after creation
/// - `created_at <= updated_at`
///
/// The serialized form is the public record contract: `message_id`,
/// `channel_id`, `parent_id` (omitted when absent), `user_id`, `message`,
/// `created_at`, `updated_at`.
///
/// # Examples
///
/// ```
/// use message_service::message::domain::{ChannelId, Message, MessageDraft, UserId};
/// use mockable::DefaultClock;
///
/// let draft = MessageDraft::new(ChannelId::new(), UserId::new(), "hi");
/// let message = Message::new(draft, &DefaultClock).expect("valid message");
///
/// assert_eq!(message.message_text(), "hi");
/// assert_eq!(message.created_at(), message.updated_at());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedMessageData")]
pub struct Message {
    message_id: MessageId,
    channel_id: ChannelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<MessageId>,
    user_id: UserId,
    #[serde(rename = "message")]
    message_text: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with a fresh identifier, stamped with the
    /// clock's current UTC time.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::NilIdentifier`] when the channel or user
    /// identifier is the nil UUID.
    pub fn new(draft: MessageDraft, clock: &impl Clock) -> Result<Self, MessageDomainError> {
        Self::new_with_id(MessageId::new(), draft, clock)
    }

    /// Creates a new message with a specified identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::NilIdentifier`] when the channel or user
    /// identifier is the nil UUID.
    pub fn new_with_id(
        message_id: MessageId,
        draft: MessageDraft,
        clock: &impl Clock,
    ) -> Result<Self, MessageDomainError> {
        if draft.channel_id.as_ref().is_nil() {
            return Err(MessageDomainError::NilIdentifier("channel_id"));
        }
        if draft.user_id.as_ref().is_nil() {
            return Err(MessageDomainError::NilIdentifier("user_id"));
        }

        let created_at = now(clock);
        Ok(Self {
            message_id,
            channel_id: draft.channel_id,
            parent_id: draft.parent_id,
            user_id: draft.user_id,
            message_text: draft.message_text,
            created_at,
            updated_at: created_at,
        })
    }

    /// Reconstructs a message from stored field values.
    ///
    /// # Errors
    ///
    /// Returns [`MessageDomainError::UpdatedBeforeCreated`] when the stored
    /// timestamps violate `created_at <= updated_at`.
    pub fn from_persisted(data: PersistedMessageData) -> Result<Self, MessageDomainError> {
        if data.updated_at < data.created_at {
            return Err(MessageDomainError::UpdatedBeforeCreated {
                created_at: data.created_at.to_rfc3339(),
                updated_at: data.updated_at.to_rfc3339(),
            });
        }

        Ok(Self {
            message_id: data.message_id,
            channel_id: data.channel_id,
            parent_id: data.parent_id,
            user_id: data.user_id,
            message_text: data.message_text,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Applies an edit: replaces the text when `message_text` is present and
    /// non-empty, and always refreshes `updated_at`.
    pub fn revise(&mut self, message_text: Option<String>, clock: &impl Clock) {
        if let Some(text) = message_text.filter(|text| !text.is_empty()) {
            self.message_text = text;
        }
        self.updated_at = now(clock).max(self.created_at);
    }

    /// Returns the reduced view published to queue consumers.
    #[must_use]
    pub fn projection(&self) -> MessageProjection {
        MessageProjection {
            channel_id: self.channel_id,
            parent_id: self.parent_id,
            user_id: self.user_id,
            message_text: self.message_text.clone(),
            created_at: Some(self.created_at),
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.message_id
    }

    /// Returns the owning channel.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Returns the parent message, if this message is a reply.
    #[must_use]
    pub const fn parent_id(&self) -> Option<MessageId> {
        self.parent_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the message text.
    #[must_use]
    pub fn message_text(&self) -> &str {
        &self.message_text
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl TryFrom<PersistedMessageData> for Message {
    type Error = MessageDomainError;

    fn try_from(data: PersistedMessageData) -> Result<Self, Self::Error> {
        Self::from_persisted(data)
    }
}
