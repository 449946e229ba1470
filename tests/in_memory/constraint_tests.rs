//! Constraint tests for the key-value repository.
//!
//! Tests duplicate detection, missing records and corrupt stored values.

use crate::in_memory::helpers::{
    Listing, MemoryRepository, channel_id, clock, collect_pages, message_in, repo, runtime,
};
use message_service::message::{
    adapters::key_value::{ALL_MESSAGES_INDEX, channel_index, record_key},
    domain::{ChannelId, MessageId},
    error::RepositoryError,
    ports::repository::MessageRepository,
};
use mockable::DefaultClock;
use rstest::rstest;
use std::io;
use tokio::runtime::Runtime;

/// Tests that a second insert of the same message is rejected and leaves
/// the index untouched.
#[rstest]
fn duplicate_insert_rejected(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let msg = message_in(channel_id, "Original message", &clock).expect("msg");
    rt.block_on(repo.insert(&msg)).expect("first insert");
    let before = collect_pages(&rt, &repo, Listing::All, 10).expect("list before");

    let result = rt.block_on(repo.insert(&msg));

    assert!(
        matches!(result, Err(RepositoryError::DuplicateKey(id)) if id == msg.id()),
        "Should reject duplicate message ID"
    );
    let after = collect_pages(&rt, &repo, Listing::All, 10).expect("list after");
    assert_eq!(before, after);
    assert_eq!(repo.store().members(ALL_MESSAGES_INDEX), vec![record_key(msg.id())]);
}

/// Tests that deleting twice reports the second delete as not found.
#[rstest]
fn double_delete_reports_not_found(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let msg = message_in(channel_id, "Short lived", &clock).expect("msg");
    rt.block_on(repo.insert(&msg)).expect("insert");

    rt.block_on(repo.delete_by_id(msg.id())).expect("first delete");
    let result = rt.block_on(repo.delete_by_id(msg.id()));

    assert!(matches!(result, Err(RepositoryError::NotFound(id)) if id == msg.id()));
    let channel_pages =
        collect_pages(&rt, &repo, Listing::Channel(channel_id), 10).expect("channel list");
    assert!(channel_pages.iter().all(|page| page.messages().is_empty()));
}

/// Tests that an update never creates a record.
#[rstest]
fn update_of_missing_record_is_not_found(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let msg = message_in(channel_id, "Never stored", &clock).expect("msg");

    let update = rt.block_on(repo.update(&msg));

    assert!(matches!(update, Err(RepositoryError::NotFound(_))));
    assert!(rt.block_on(repo.find_by_id(msg.id())).is_err());
}

/// Tests that a stored value that is not a message record is reported as
/// corrupt rather than missing.
#[rstest]
fn corrupt_record_is_reported(runtime: io::Result<Runtime>, repo: MemoryRepository) {
    let rt = runtime.expect("runtime creation");
    let id = MessageId::new();
    repo.store()
        .put_raw(&record_key(id), r#"{"message_id":"not-a-uuid"}"#)
        .expect("seed corrupt value");

    let result = rt.block_on(repo.find_by_id(id));

    assert!(matches!(result, Err(RepositoryError::Corrupt { .. })));
}

/// Tests that a corrupt record can still be deleted, which unblocks listings
/// that would otherwise fail on it.
#[rstest]
fn corrupt_record_can_be_deleted(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let id = MessageId::new();
    let key = record_key(id);
    let channel = channel_index(channel_id);
    repo.store().put_raw(&key, "garbage").expect("seed value");
    repo.store()
        .add_member(ALL_MESSAGES_INDEX, &key)
        .expect("seed global member");
    repo.store()
        .add_member(&channel, &key)
        .expect("seed channel member");
    assert!(collect_pages(&rt, &repo, Listing::All, 10).is_err());

    rt.block_on(repo.delete_by_id(id)).expect("delete corrupt record");

    let second = rt.block_on(repo.delete_by_id(id));
    assert!(matches!(second, Err(RepositoryError::NotFound(missing)) if missing == id));
    assert!(repo.store().members(ALL_MESSAGES_INDEX).is_empty());
    let all = collect_pages(&rt, &repo, Listing::All, 10).expect("list all");
    assert!(all.iter().all(|page| page.messages().is_empty()));
    let in_channel =
        collect_pages(&rt, &repo, Listing::Channel(channel_id), 10).expect("list channel");
    assert!(in_channel.iter().all(|page| page.messages().is_empty()));
}

/// Tests that a record whose timestamps are out of order is corrupt.
#[rstest]
fn record_with_reversed_timestamps_is_corrupt(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
) {
    let rt = runtime.expect("runtime creation");
    let id = MessageId::new();
    let raw = serde_json::json!({
        "message_id": id,
        "channel_id": ChannelId::new(),
        "user_id": uuid::Uuid::new_v4(),
        "message": "time travel",
        "created_at": "2026-02-02T00:00:00Z",
        "updated_at": "2026-02-01T00:00:00Z",
    });
    repo.store()
        .put_raw(&record_key(id), &raw.to_string())
        .expect("seed value");

    let result = rt.block_on(repo.find_by_id(id));

    assert!(matches!(result, Err(RepositoryError::Corrupt { .. })));
}
