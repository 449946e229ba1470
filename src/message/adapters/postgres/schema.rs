//! Diesel schema for message persistence.

diesel::table! {
    /// Message records, one row per message.
    messages (message_id) {
        /// Message identifier.
        message_id -> Uuid,
        /// Owning channel.
        channel_id -> Uuid,
        /// Parent message for replies.
        parent_id -> Nullable<Uuid>,
        /// Author.
        user_id -> Uuid,
        /// Message text.
        message_text -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
