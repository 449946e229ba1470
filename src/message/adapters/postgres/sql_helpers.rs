//! SQL statements and error mapping for the `PostgreSQL` repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use super::conversion_helpers::TimeCursor;
use super::models::{MessageRow, NewMessageRow};
use super::schema::messages;
use crate::message::{domain::MessageId, error::RepositoryError, ports::repository::RepositoryResult};

/// Sort direction of a keyset listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Ascending,
    Descending,
}

/// Maps an insert failure, reporting a primary-key clash as a duplicate.
pub(super) fn map_insert_error(err: DieselError, id: MessageId) -> RepositoryError {
    if matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    ) {
        RepositoryError::DuplicateKey(id)
    } else {
        RepositoryError::backend(err)
    }
}

/// Returns `true` when the statement failed because the table is missing.
pub(super) fn is_undefined_table(err: &DieselError) -> bool {
    let DieselError::DatabaseError(_, info) = err else {
        return false;
    };
    // Diesel does not expose SQLSTATE 42P01, only the server message.
    relation_missing(info.as_ref())
}

fn relation_missing(info: &dyn DatabaseErrorInformation) -> bool {
    let message = info.message();
    message.starts_with("relation ") && message.ends_with(" does not exist")
}

pub(super) fn insert_message(conn: &mut PgConnection, row: &NewMessageRow) -> QueryResult<usize> {
    diesel::insert_into(messages::table).values(row).execute(conn)
}

pub(super) fn find_message(conn: &mut PgConnection, id: Uuid) -> QueryResult<Option<MessageRow>> {
    messages::table
        .find(id)
        .select(MessageRow::as_select())
        .first::<MessageRow>(conn)
        .optional()
}

/// Rewrites the mutable columns of one row, returning the rows affected.
pub(super) fn update_message(
    conn: &mut PgConnection,
    id: Uuid,
    text: String,
    updated_at: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::update(messages::table.find(id))
        .set((
            messages::message_text.eq(text),
            messages::updated_at.eq(updated_at),
        ))
        .execute(conn)
}

pub(super) fn delete_message(conn: &mut PgConnection, id: Uuid) -> QueryResult<usize> {
    diesel::delete(messages::table.find(id)).execute(conn)
}

/// Loads up to `limit` rows ordered by `message_id`, after `after` if set.
pub(super) fn list_by_id(
    conn: &mut PgConnection,
    after: Option<Uuid>,
    limit: i64,
) -> RepositoryResult<Vec<MessageRow>> {
    let mut query = messages::table
        .select(MessageRow::as_select())
        .order(messages::message_id.asc())
        .limit(limit)
        .into_boxed();
    if let Some(id) = after {
        query = query.filter(messages::message_id.gt(id));
    }
    query.load(conn).map_err(RepositoryError::backend)
}

/// Column a time-ordered listing filters on.
#[derive(Debug, Clone, Copy)]
pub(super) enum Scope {
    Channel(Uuid),
    Parent(Uuid),
}

/// Loads up to `limit` rows in `scope` ordered by `(created_at, message_id)`
/// in `direction`, strictly past `after` if set.
pub(super) fn list_by_time(
    conn: &mut PgConnection,
    scope: Scope,
    after: Option<TimeCursor>,
    direction: Direction,
    limit: i64,
) -> RepositoryResult<Vec<MessageRow>> {
    let mut query = messages::table
        .select(MessageRow::as_select())
        .limit(limit)
        .into_boxed();

    query = match scope {
        Scope::Channel(id) => query.filter(messages::channel_id.eq(id)),
        Scope::Parent(id) => query.filter(messages::parent_id.eq(id)),
    };

    query = match direction {
        Direction::Ascending => query.order((
            messages::created_at.asc(),
            messages::message_id.asc(),
        )),
        Direction::Descending => query.order((
            messages::created_at.desc(),
            messages::message_id.desc(),
        )),
    };

    if let Some(position) = after {
        let ts = position.created_at;
        let id = position.message_id;
        query = match direction {
            Direction::Ascending => query.filter(
                messages::created_at
                    .gt(ts)
                    .or(messages::created_at.eq(ts).and(messages::message_id.gt(id))),
            ),
            Direction::Descending => query.filter(
                messages::created_at
                    .lt(ts)
                    .or(messages::created_at.eq(ts).and(messages::message_id.lt(id))),
            ),
        };
    }

    query.load(conn).map_err(RepositoryError::backend)
}
