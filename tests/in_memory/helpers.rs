//! Shared test helpers for in-memory repository integration tests.

use message_service::message::{
    adapters::{key_value::KeyValueMessageRepository, memory::InMemoryKeyValueStore},
    domain::{
        ChannelId, Message, MessageDomainError, MessageDraft, MessageId, MessagePage, PageRequest,
        UserId,
    },
    ports::repository::{MessageRepository, RepositoryResult},
};
use mockable::DefaultClock;
use rstest::fixture;
use std::io;
use tokio::runtime::Runtime;

/// Key-value repository over a fresh in-memory store.
pub type MemoryRepository = KeyValueMessageRepository<InMemoryKeyValueStore>;

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Provides a fresh repository for each test.
#[fixture]
pub fn repo() -> MemoryRepository {
    KeyValueMessageRepository::new(InMemoryKeyValueStore::new())
}

/// Provides a clock for message creation.
#[fixture]
pub fn clock() -> DefaultClock {
    DefaultClock
}

/// Provides a channel identifier for tests.
#[fixture]
pub fn channel_id() -> ChannelId {
    ChannelId::new()
}

/// Builds a top-level message in `channel_id`.
///
/// # Errors
///
/// Returns an error if `channel_id` is nil.
pub fn message_in(
    channel_id: ChannelId,
    text: &str,
    clock: &DefaultClock,
) -> Result<Message, MessageDomainError> {
    Message::new(MessageDraft::new(channel_id, UserId::new(), text), clock)
}

/// Builds a reply to `parent_id` in `channel_id`.
///
/// # Errors
///
/// Returns an error if `channel_id` is nil.
pub fn reply_to(
    parent_id: MessageId,
    channel_id: ChannelId,
    text: &str,
    clock: &DefaultClock,
) -> Result<Message, MessageDomainError> {
    Message::new(
        MessageDraft::new(channel_id, UserId::new(), text).with_parent(parent_id),
        clock,
    )
}

/// Which membership index a listing walks.
#[derive(Debug, Clone, Copy)]
pub enum Listing {
    /// Every stored message.
    All,
    /// Messages posted to one channel.
    Channel(ChannelId),
    /// Replies to one message.
    Parent(MessageId),
}

/// Follows `next` cursors from the first page until the listing ends,
/// returning every page in order.
///
/// # Errors
///
/// Returns the first repository error encountered.
pub fn collect_pages(
    rt: &Runtime,
    repo: &MemoryRepository,
    listing: Listing,
    size: u32,
) -> RepositoryResult<Vec<MessagePage>> {
    let mut request = PageRequest::first(size)?;
    let mut pages = Vec::new();
    loop {
        let page = match listing {
            Listing::All => rt.block_on(repo.find_all(&request)),
            Listing::Channel(channel_id) => {
                rt.block_on(repo.find_by_channel_id(channel_id, &request))
            }
            Listing::Parent(parent_id) => rt.block_on(repo.find_by_parent_id(parent_id, &request)),
        }?;
        let next = page.next().cloned();
        pages.push(page);
        match next {
            Some(cursor) => request = request.resume(cursor),
            None => return Ok(pages),
        }
    }
}

/// Stores each message, failing on the first error.
///
/// # Errors
///
/// Returns the first insert error.
pub fn store_all(
    rt: &Runtime,
    repo: &MemoryRepository,
    messages: &[Message],
) -> RepositoryResult<()> {
    for message in messages {
        rt.block_on(repo.insert(message))?;
    }
    Ok(())
}
