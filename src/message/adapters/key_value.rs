//! Key-value implementation of the `MessageRepository` port.
//!
//! Each message is one JSON record under `message:{id}`. The record key is
//! also a member of the `messages` set, of `channel:{channel_id}:messages`,
//! and, for replies, of `parent:{parent_id}:messages`. Listing walks one of
//! these sets with the store's incremental scan; the scan cursor becomes the
//! page cursor.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::message::{
    domain::{ChannelId, Cursor, Message, MessageId, MessagePage, PageRequest},
    error::RepositoryError,
    ports::{
        key_value::KeyValueStore,
        repository::{MessageRepository, RepositoryResult},
    },
};

/// Set holding the record key of every stored message.
pub const ALL_MESSAGES_INDEX: &str = "messages";

/// Returns the key of the record holding message `id`.
#[must_use]
pub fn record_key(id: MessageId) -> String {
    format!("message:{id}")
}

/// Returns the index set for messages posted to `channel_id`.
#[must_use]
pub fn channel_index(channel_id: ChannelId) -> String {
    format!("channel:{channel_id}:messages")
}

/// Returns the index set for replies to `parent_id`.
#[must_use]
pub fn parent_index(parent_id: MessageId) -> String {
    format!("parent:{parent_id}:messages")
}

fn indexes_for(message: &Message) -> Vec<String> {
    let mut indexes = vec![
        ALL_MESSAGES_INDEX.to_owned(),
        channel_index(message.channel_id()),
    ];
    if let Some(parent_id) = message.parent_id() {
        indexes.push(parent_index(parent_id));
    }
    indexes
}

fn encode(message: &Message) -> RepositoryResult<String> {
    serde_json::to_string(message).map_err(RepositoryError::backend)
}

fn decode(key: &str, raw: &str) -> RepositoryResult<Message> {
    serde_json::from_str(raw).map_err(|err| RepositoryError::corrupt(key, err))
}

/// Parses a page cursor into a store scan cursor. An absent cursor starts a
/// new scan.
fn scan_cursor(page: &PageRequest) -> RepositoryResult<u64> {
    page.cursor().map_or(Ok(0), |cursor| {
        cursor
            .as_str()
            .parse::<u64>()
            .map_err(|_| RepositoryError::invalid_cursor(cursor))
    })
}

/// [`MessageRepository`] over any [`KeyValueStore`].
///
/// Paging follows the store's scan semantics: `page.size()` is a batch-size
/// hint, so a page may hold more or fewer messages than requested, and the
/// walk is finished when `next` is `None`. Index members whose record has
/// vanished between the scan and the read are skipped.
///
/// # Example
///
/// ```
/// use message_service::message::adapters::key_value::KeyValueMessageRepository;
/// use message_service::message::adapters::memory::InMemoryKeyValueStore;
///
/// let repo = KeyValueMessageRepository::new(InMemoryKeyValueStore::new());
/// # let _ = repo;
/// ```
#[derive(Debug, Clone)]
pub struct KeyValueMessageRepository<S> {
    store: S,
}

impl<S: KeyValueStore> KeyValueMessageRepository<S> {
    /// Creates a repository over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn list_index(&self, index: &str, page: &PageRequest) -> RepositoryResult<MessagePage> {
        let cursor = scan_cursor(page)?;
        let scan = self.store.scan_index(index, cursor, page.size()).await?;

        let messages = if scan.members.is_empty() {
            Vec::new()
        } else {
            let values = self.store.get_many(&scan.members).await?;
            let mut messages = Vec::with_capacity(values.len());
            for (key, value) in scan.members.iter().zip(values) {
                let Some(raw) = value else {
                    debug!(%key, "skipping index member without a record");
                    continue;
                };
                messages.push(decode(key, &raw)?);
            }
            messages
        };

        let next = (scan.cursor != 0).then(|| Cursor::new(scan.cursor.to_string()));
        Ok(MessagePage::new(messages, next))
    }
}

#[async_trait]
impl<S: KeyValueStore> MessageRepository for KeyValueMessageRepository<S> {
    async fn insert(&self, message: &Message) -> RepositoryResult<()> {
        let key = record_key(message.id());
        let value = encode(message)?;
        let inserted = self
            .store
            .insert_indexed(&key, &value, &indexes_for(message))
            .await?;
        if inserted {
            Ok(())
        } else {
            Err(RepositoryError::DuplicateKey(message.id()))
        }
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Message> {
        let key = record_key(id);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;
        decode(&key, &raw)
    }

    async fn update(&self, message: &Message) -> RepositoryResult<()> {
        // Indexed fields are immutable, so only the record is rewritten.
        let key = record_key(message.id());
        let value = encode(message)?;
        if self.store.replace(&key, &value).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(message.id()))
        }
    }

    async fn delete_by_id(&self, id: MessageId) -> RepositoryResult<()> {
        let key = record_key(id);
        let raw = self
            .store
            .get(&key)
            .await?
            .ok_or(RepositoryError::NotFound(id))?;
        // An undecodable record cannot name its channel or parent; those
        // members are left behind and skipped as vanished when listed.
        let indexes = decode(&key, &raw).map_or_else(
            |err| {
                warn!(%key, error = %err, "deleting corrupt record");
                vec![ALL_MESSAGES_INDEX.to_owned()]
            },
            |message| indexes_for(&message),
        );

        if self.store.remove_indexed(&key, &indexes).await? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(id))
        }
    }

    async fn find_all(&self, page: &PageRequest) -> RepositoryResult<MessagePage> {
        self.list_index(ALL_MESSAGES_INDEX, page).await
    }

    async fn find_by_channel_id(
        &self,
        channel_id: ChannelId,
        page: &PageRequest,
    ) -> RepositoryResult<MessagePage> {
        self.list_index(&channel_index(channel_id), page).await
    }

    async fn find_by_parent_id(
        &self,
        parent_id: MessageId,
        page: &PageRequest,
    ) -> RepositoryResult<MessagePage> {
        self.list_index(&parent_index(parent_id), page).await
    }
}
