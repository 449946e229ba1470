//! Diesel row models for message persistence.

use super::schema::messages;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Query result row for message records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Message identifier.
    pub message_id: Uuid,
    /// Owning channel.
    pub channel_id: Uuid,
    /// Parent message for replies.
    pub parent_id: Option<Uuid>,
    /// Author.
    pub user_id: Uuid,
    /// Message text.
    pub message_text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for message records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    /// Message identifier.
    pub message_id: Uuid,
    /// Owning channel.
    pub channel_id: Uuid,
    /// Parent message for replies.
    pub parent_id: Option<Uuid>,
    /// Author.
    pub user_id: Uuid,
    /// Message text.
    pub message_text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
