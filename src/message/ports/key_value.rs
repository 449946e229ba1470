//! Port for the primitive operations of a key-value store.
//!
//! The key-value message repository is written against this trait so the
//! same record and index logic runs over Redis in production and over an
//! in-memory map in tests.

use crate::message::ports::repository::RepositoryResult;
use async_trait::async_trait;

/// One batch returned by an incremental index scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexScan {
    /// Cursor to pass to the next scan; `0` means the scan is complete.
    pub cursor: u64,
    /// Index members returned by this batch.
    pub members: Vec<String>,
}

/// String-keyed store with set-based indexes.
///
/// Each method is a single round trip. Methods that take `indexes` apply the
/// value write and every index update as one all-or-nothing unit.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    async fn get(&self, key: &str) -> RepositoryResult<Option<String>>;

    /// Reads several keys at once, preserving order; absent keys yield `None`.
    async fn get_many(&self, keys: &[String]) -> RepositoryResult<Vec<Option<String>>>;

    /// Writes `value` under `key` only if the key is absent, adding `key` to
    /// every set in `indexes`. Returns `false`, with nothing written, when
    /// the key already exists.
    async fn insert_indexed(&self, key: &str, value: &str, indexes: &[String])
    -> RepositoryResult<bool>;

    /// Overwrites `value` under `key` only if the key exists. Returns
    /// `false` when it does not.
    async fn replace(&self, key: &str, value: &str) -> RepositoryResult<bool>;

    /// Deletes `key` and removes it from every set in `indexes`. Returns
    /// `false`, leaving the indexes untouched, when the key is absent.
    async fn remove_indexed(&self, key: &str, indexes: &[String]) -> RepositoryResult<bool>;

    /// Scans the members of the `index` set, starting at `cursor` (`0` to
    /// start), returning roughly `count` members per batch.
    async fn scan_index(&self, index: &str, cursor: u64, count: u32)
    -> RepositoryResult<IndexScan>;
}
