//! In-memory key-value store for tests and single-process runs.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::message::{
    error::RepositoryError,
    ports::{
        key_value::{IndexScan, KeyValueStore},
        repository::RepositoryResult,
    },
};

/// Thread-safe in-memory [`KeyValueStore`].
///
/// Sets are ordered, and a scan cursor is the offset of the next member, so
/// a scan returns exactly `count` members per batch until the set runs out.
/// Every write takes the single write lock, which makes indexed writes
/// all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    values: HashMap<String, String>,
    sets: HashMap<String, BTreeSet<String>>,
}

fn store_error(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::backend(std::io::Error::other(err.to_string()))
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, InMemoryStoreState>> {
        self.state.read().map_err(store_error)
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state.write().map_err(store_error)
    }

    /// Returns the number of stored values.
    ///
    /// Returns `0` if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|state| state.values.len()).unwrap_or(0)
    }

    /// Returns `true` if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the members of `index` in scan order.
    ///
    /// Returns an empty list if the set is absent or the lock is poisoned.
    #[must_use]
    pub fn members(&self, index: &str) -> Vec<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.sets.get(index).map(|set| set.iter().cloned().collect()))
            .unwrap_or_default()
    }

    /// Stores `value` under `key` with no index bookkeeping.
    ///
    /// Used to seed records that bypass the repository, such as corrupt
    /// payloads or index entries whose record is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BackendUnavailable`] if the lock is
    /// poisoned.
    pub fn put_raw(&self, key: &str, value: &str) -> RepositoryResult<()> {
        self.write()?.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    /// Adds `member` to `index` with no value bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::BackendUnavailable`] if the lock is
    /// poisoned.
    pub fn add_member(&self, index: &str, member: &str) -> RepositoryResult<()> {
        self.write()?
            .sets
            .entry(index.to_owned())
            .or_default()
            .insert(member.to_owned());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self.read()?.values.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> RepositoryResult<Vec<Option<String>>> {
        let state = self.read()?;
        Ok(keys.iter().map(|key| state.values.get(key).cloned()).collect())
    }

    async fn insert_indexed(
        &self,
        key: &str,
        value: &str,
        indexes: &[String],
    ) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.values.contains_key(key) {
            return Ok(false);
        }
        state.values.insert(key.to_owned(), value.to_owned());
        for index in indexes {
            state
                .sets
                .entry(index.clone())
                .or_default()
                .insert(key.to_owned());
        }
        Ok(true)
    }

    async fn replace(&self, key: &str, value: &str) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        let stored = state.values.get_mut(key);
        let replaced = stored.is_some();
        if let Some(slot) = stored {
            value.clone_into(slot);
        }
        Ok(replaced)
    }

    async fn remove_indexed(&self, key: &str, indexes: &[String]) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.values.remove(key).is_none() {
            return Ok(false);
        }
        for index in indexes {
            let emptied = state.sets.get_mut(index).is_some_and(|set| {
                set.remove(key);
                set.is_empty()
            });
            if emptied {
                state.sets.remove(index);
            }
        }
        Ok(true)
    }

    async fn scan_index(
        &self,
        index: &str,
        cursor: u64,
        count: u32,
    ) -> RepositoryResult<IndexScan> {
        let state = self.read()?;
        let Some(set) = state.sets.get(index) else {
            return Ok(IndexScan::default());
        };

        let offset = usize::try_from(cursor).map_err(|_| RepositoryError::invalid_cursor(cursor))?;
        let batch = usize::try_from(count).map_err(store_error)?;
        let members: Vec<String> = set.iter().skip(offset).take(batch).cloned().collect();

        let consumed = offset.saturating_add(members.len());
        let next_cursor = if consumed >= set.len() {
            0
        } else {
            u64::try_from(consumed).map_err(store_error)?
        };
        Ok(IndexScan {
            cursor: next_cursor,
            members,
        })
    }
}
