//! Conversions between database rows, domain messages and page cursors.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{MessageRow, NewMessageRow};
use crate::message::{
    domain::{ChannelId, Cursor, Message, MessageId, PersistedMessageData, UserId},
    error::RepositoryError,
    ports::repository::RepositoryResult,
};

/// Converts a domain message into an insert row.
pub(super) fn to_new_row(message: &Message) -> NewMessageRow {
    NewMessageRow {
        message_id: message.id().into_inner(),
        channel_id: message.channel_id().into_inner(),
        parent_id: message.parent_id().map(MessageId::into_inner),
        user_id: message.user_id().into_inner(),
        message_text: message.message_text().to_owned(),
        created_at: message.created_at(),
        updated_at: message.updated_at(),
    }
}

/// Converts a database row to a domain message.
///
/// # Errors
///
/// Returns [`RepositoryError::Corrupt`] when the row violates a message
/// invariant.
pub(super) fn row_to_message(row: MessageRow) -> RepositoryResult<Message> {
    let key = row.message_id.to_string();
    Message::from_persisted(PersistedMessageData {
        message_id: MessageId::from_uuid(row.message_id),
        channel_id: ChannelId::from_uuid(row.channel_id),
        parent_id: row.parent_id.map(MessageId::from_uuid),
        user_id: UserId::from_uuid(row.user_id),
        message_text: row.message_text,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
    .map_err(|err| RepositoryError::corrupt(key, err))
}

/// Keyset position of the last row on a page ordered by `message_id`.
pub(super) fn decode_id_cursor(cursor: &Cursor) -> RepositoryResult<Uuid> {
    Uuid::parse_str(cursor.as_str()).map_err(|_| RepositoryError::invalid_cursor(cursor))
}

/// Encodes the keyset position of `row` for pages ordered by `message_id`.
pub(super) fn encode_id_cursor(row: &MessageRow) -> Cursor {
    Cursor::new(row.message_id.to_string())
}

/// Keyset position of the last row on a page ordered by
/// `(created_at, message_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TimeCursor {
    pub created_at: DateTime<Utc>,
    pub message_id: Uuid,
}

/// Encodes the keyset position of `row` as `{created_at micros}:{message_id}`.
pub(super) fn encode_time_cursor(row: &MessageRow) -> Cursor {
    Cursor::new(format!(
        "{}:{}",
        row.created_at.timestamp_micros(),
        row.message_id
    ))
}

/// Decodes a cursor produced by [`encode_time_cursor`].
pub(super) fn decode_time_cursor(cursor: &Cursor) -> RepositoryResult<TimeCursor> {
    let invalid = || RepositoryError::invalid_cursor(cursor);
    let (micros, id) = cursor.as_str().split_once(':').ok_or_else(invalid)?;
    let created_at = micros
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_micros)
        .ok_or_else(invalid)?;
    let message_id = Uuid::parse_str(id).map_err(|_| invalid())?;
    Ok(TimeCursor {
        created_at,
        message_id,
    })
}
