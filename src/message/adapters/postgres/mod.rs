//! `PostgreSQL` implementation of the `MessageRepository` port using Diesel ORM.
//!
//! Messages live in one `messages` table. Listings use keyset pagination:
//! `find_all` orders by `message_id`, channel listings by
//! `(created_at, message_id)` ascending, and reply listings by the same key
//! descending so the newest replies come first.

mod blocking_helpers;
mod conversion_helpers;
mod models;
mod schema;
mod sql_helpers;

use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use tracing::{error, info, warn};

use crate::message::{
    domain::{ChannelId, Cursor, Message, MessageId, MessagePage, PageRequest},
    error::RepositoryError,
    ports::repository::{MessageRepository, RepositoryResult},
};

pub use blocking_helpers::{PgPool, StatementTimeout, build_pool};
use blocking_helpers::run_blocking;
use conversion_helpers::{
    decode_id_cursor, decode_time_cursor, encode_id_cursor, encode_time_cursor, row_to_message,
    to_new_row,
};
use models::MessageRow;
use sql_helpers::{
    Direction, Scope, delete_message, find_message, insert_message, is_undefined_table, list_by_id,
    list_by_time, map_insert_error, update_message,
};

/// Schema applied by [`PostgresMessageRepository::migrate`].
pub const MIGRATION_SQL: &str =
    include_str!("../../../../migrations/2026-01-15-000000_create_messages/up.sql");

/// `PostgreSQL` implementation of [`MessageRepository`].
///
/// Uses Diesel ORM with connection pooling via r2d2. All database operations
/// are offloaded to a blocking thread pool via [`tokio::task::spawn_blocking`]
/// to avoid blocking the async runtime.
///
/// A page holding fewer rows than requested is the last one. A full page
/// always carries a cursor, so a listing whose size divides the row count
/// ends with one empty page.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use message_service::message::adapters::postgres::{PostgresMessageRepository, build_pool};
///
/// let pool = build_pool("postgres://...", 10, Duration::from_secs(5))?;
/// let repo = PostgresMessageRepository::new(pool);
/// repo.migrate().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
    self_healing: bool,
}

impl PostgresMessageRepository {
    /// Creates a new repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            self_healing: false,
        }
    }

    /// Enables or disables schema repair when an insert finds the table
    /// missing. The failing insert still reports its error.
    #[must_use]
    pub const fn with_self_healing(mut self, enabled: bool) -> Self {
        self.self_healing = enabled;
        self
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `messages` table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BackendUnavailable`] if the schema cannot
    /// be applied.
    pub async fn migrate(&self) -> RepositoryResult<()> {
        run_blocking(&self.pool, |conn| {
            conn.batch_execute(MIGRATION_SQL)
                .map_err(RepositoryError::backend)
        })
        .await?;
        info!("message schema is up to date");
        Ok(())
    }

    async fn heal_schema(&self) {
        warn!("messages table missing, applying schema");
        if let Err(err) = self.migrate().await {
            error!(error = %err, "schema repair failed");
        }
    }
}

fn page_of(
    rows: Vec<MessageRow>,
    page: &PageRequest,
    cursor_of: fn(&MessageRow) -> Cursor,
) -> RepositoryResult<MessagePage> {
    let full = u32::try_from(rows.len()).is_ok_and(|len| len >= page.size());
    let next = rows.last().filter(|_| full).map(cursor_of);
    let messages = rows
        .into_iter()
        .map(row_to_message)
        .collect::<RepositoryResult<Vec<_>>>()?;
    Ok(MessagePage::new(messages, next))
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, message: &Message) -> RepositoryResult<()> {
        let row = to_new_row(message);
        let outcome = run_blocking(&self.pool, move |conn| Ok(insert_message(conn, &row))).await?;

        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                if self.self_healing && is_undefined_table(&err) {
                    self.heal_schema().await;
                }
                Err(map_insert_error(err, message.id()))
            }
        }
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Message> {
        let uuid = id.into_inner();
        let row = run_blocking(&self.pool, move |conn| {
            find_message(conn, uuid).map_err(RepositoryError::backend)
        })
        .await?;
        row.ok_or(RepositoryError::NotFound(id))
            .and_then(row_to_message)
    }

    async fn update(&self, message: &Message) -> RepositoryResult<()> {
        let uuid = message.id().into_inner();
        let text = message.message_text().to_owned();
        let updated_at = message.updated_at();

        let affected = run_blocking(&self.pool, move |conn| {
            update_message(conn, uuid, text, updated_at).map_err(RepositoryError::backend)
        })
        .await?;

        if affected == 0 {
            return Err(RepositoryError::NotFound(message.id()));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: MessageId) -> RepositoryResult<()> {
        let uuid = id.into_inner();
        let affected = run_blocking(&self.pool, move |conn| {
            delete_message(conn, uuid).map_err(RepositoryError::backend)
        })
        .await?;

        if affected == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn find_all(&self, page: &PageRequest) -> RepositoryResult<MessagePage> {
        let after = page.cursor().map(decode_id_cursor).transpose()?;
        let limit = i64::from(page.size());
        let rows = run_blocking(&self.pool, move |conn| list_by_id(conn, after, limit)).await?;
        page_of(rows, page, encode_id_cursor)
    }

    async fn find_by_channel_id(
        &self,
        channel_id: ChannelId,
        page: &PageRequest,
    ) -> RepositoryResult<MessagePage> {
        let after = page.cursor().map(decode_time_cursor).transpose()?;
        let scope = Scope::Channel(channel_id.into_inner());
        let limit = i64::from(page.size());
        let rows = run_blocking(&self.pool, move |conn| {
            list_by_time(conn, scope, after, Direction::Ascending, limit)
        })
        .await?;
        page_of(rows, page, encode_time_cursor)
    }

    async fn find_by_parent_id(
        &self,
        parent_id: MessageId,
        page: &PageRequest,
    ) -> RepositoryResult<MessagePage> {
        let after = page.cursor().map(decode_time_cursor).transpose()?;
        let scope = Scope::Parent(parent_id.into_inner());
        let limit = i64::from(page.size());
        let rows = run_blocking(&self.pool, move |conn| {
            list_by_time(conn, scope, after, Direction::Descending, limit)
        })
        .await?;
        page_of(rows, page, encode_time_cursor)
    }
}
