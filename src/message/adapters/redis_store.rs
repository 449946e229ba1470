//! Redis implementation of the `KeyValueStore` port.
//!
//! Indexed writes run as Lua scripts so the record and its index sets change
//! together: a duplicate insert leaves the indexes untouched and a delete of
//! a missing key removes nothing.

use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};

use crate::message::{
    error::RepositoryError,
    ports::{
        key_value::{IndexScan, KeyValueStore},
        repository::RepositoryResult,
    },
};

/// `KEYS[1]` is the record, `KEYS[2..]` the index sets, `ARGV[1]` the value.
const INSERT_INDEXED_SCRIPT: &str = r"
if redis.call('SET', KEYS[1], ARGV[1], 'NX') then
    for i = 2, #KEYS do
        redis.call('SADD', KEYS[i], KEYS[1])
    end
    return 1
end
return 0
";

const REPLACE_SCRIPT: &str = r"
if redis.call('SET', KEYS[1], ARGV[1], 'XX') then
    return 1
end
return 0
";

/// `KEYS[1]` is the record, `KEYS[2..]` the index sets.
const REMOVE_INDEXED_SCRIPT: &str = r"
if redis.call('DEL', KEYS[1]) == 1 then
    for i = 2, #KEYS do
        redis.call('SREM', KEYS[i], KEYS[1])
    end
    return 1
end
return 0
";

/// [`KeyValueStore`] backed by a Redis server.
///
/// Holds a [`ConnectionManager`], which multiplexes one connection and
/// reconnects after failures, so the store is cheap to clone.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKeyValueStore").finish_non_exhaustive()
    }
}

impl RedisKeyValueStore {
    /// Wraps an established connection manager.
    #[must_use]
    pub const fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Connects to the server at `url` (`redis://host:port/db`).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BackendUnavailable`] if the URL is invalid
    /// or the server cannot be reached.
    pub async fn connect(url: &str) -> RepositoryResult<Self> {
        let client = redis::Client::open(url).map_err(RepositoryError::backend)?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(RepositoryError::backend)?;
        Ok(Self::new(connection))
    }

    async fn run_keyed_script(
        &self,
        source: &str,
        key: &str,
        indexes: &[String],
        value: Option<&str>,
    ) -> RepositoryResult<bool> {
        let mut conn = self.connection.clone();
        let script = Script::new(source);
        let mut invocation = script.prepare_invoke();
        invocation.key(key);
        for index in indexes {
            invocation.key(index);
        }
        if let Some(payload) = value {
            invocation.arg(payload);
        }

        let applied: i64 = invocation
            .invoke_async(&mut conn)
            .await
            .map_err(RepositoryError::backend)?;
        Ok(applied == 1)
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(RepositoryError::backend)?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> RepositoryResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(RepositoryError::backend)?;
        Ok(values)
    }

    async fn insert_indexed(
        &self,
        key: &str,
        value: &str,
        indexes: &[String],
    ) -> RepositoryResult<bool> {
        self.run_keyed_script(INSERT_INDEXED_SCRIPT, key, indexes, Some(value))
            .await
    }

    async fn replace(&self, key: &str, value: &str) -> RepositoryResult<bool> {
        self.run_keyed_script(REPLACE_SCRIPT, key, &[], Some(value))
            .await
    }

    async fn remove_indexed(&self, key: &str, indexes: &[String]) -> RepositoryResult<bool> {
        self.run_keyed_script(REMOVE_INDEXED_SCRIPT, key, indexes, None)
            .await
    }

    async fn scan_index(
        &self,
        index: &str,
        cursor: u64,
        count: u32,
    ) -> RepositoryResult<IndexScan> {
        let mut conn = self.connection.clone();
        let (next_cursor, members): (u64, Vec<String>) = redis::cmd("SSCAN")
            .arg(index)
            .arg(cursor)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(RepositoryError::backend)?;
        Ok(IndexScan {
            cursor: next_cursor,
            members,
        })
    }
}
