//! Connection pool and blocking operation helpers for `PostgreSQL`.
//!
//! Diesel is synchronous, so every query runs on tokio's blocking thread
//! pool with a connection checked out of an r2d2 pool.

use std::time::Duration;

use diesel::PgConnection;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};

use crate::message::{error::RepositoryError, ports::repository::RepositoryResult};

/// `PostgreSQL` connection pool type.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Sets `statement_timeout` on every connection handed out by the pool, so
/// the server abandons queries that outlive the caller's deadline.
#[derive(Debug, Clone, Copy)]
pub struct StatementTimeout(pub Duration);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, conn: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "SET statement_timeout = {}",
            self.0.as_millis()
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds a connection pool for `database_url`.
///
/// This establishes the initial connections and therefore blocks; call it
/// from a blocking context.
///
/// # Errors
///
/// Returns [`RepositoryError::BackendUnavailable`] if the server cannot be
/// reached within the pool's connection timeout.
pub fn build_pool(
    database_url: &str,
    max_size: u32,
    statement_timeout: Duration,
) -> RepositoryResult<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(StatementTimeout(statement_timeout)))
        .build(manager)
        .map_err(RepositoryError::backend)
}

/// Runs `f` with a pooled connection on the blocking thread pool.
pub(super) async fn run_blocking<F, T>(pool: &PgPool, f: F) -> RepositoryResult<T>
where
    F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let shared = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = shared.get().map_err(RepositoryError::backend)?;
        f(&mut conn)
    })
    .await
    .map_err(RepositoryError::backend)?
}
