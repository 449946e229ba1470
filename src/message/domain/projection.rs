//! Reduced message view handed to the publish sink.

use super::{ChannelId, MessageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event payload announcing a newly created message.
///
/// Omits `message_id` and `updated_at`, and names the text field
/// `message_text` rather than the record's `message`. Consumers depend on
/// this exact shape, so the field names must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageProjection {
    /// Owning channel.
    pub channel_id: ChannelId,
    /// Parent message, omitted from the payload when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MessageId>,
    /// Author.
    pub user_id: UserId,
    /// Message text.
    pub message_text: String,
    /// Creation timestamp, omitted from the payload when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}
