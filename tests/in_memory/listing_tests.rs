//! Listing tests for the key-value repository.
//!
//! Walks the membership indexes with small pages and checks that every
//! stored message is returned exactly once.

use crate::in_memory::helpers::{
    Listing, MemoryRepository, channel_id, clock, collect_pages, message_in, repo, reply_to,
    runtime, store_all,
};
use message_service::message::{
    domain::{ChannelId, Message, MessageId},
    ports::repository::MessageRepository,
};
use mockable::DefaultClock;
use rstest::rstest;
use std::collections::HashSet;
use std::io;
use tokio::runtime::Runtime;

fn ids(pages: &[message_service::message::domain::MessagePage]) -> Vec<MessageId> {
    pages
        .iter()
        .flat_map(|page| page.messages().iter().map(Message::id))
        .collect()
}

/// Tests that pages of two over five messages cover the set exactly once.
#[rstest]
fn small_pages_cover_every_message(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let messages: Vec<Message> = (0..5)
        .map(|n| message_in(channel_id, &format!("m{n}"), &clock).expect("msg"))
        .collect();
    store_all(&rt, &repo, &messages).expect("store");

    let pages = collect_pages(&rt, &repo, Listing::All, 2).expect("walk");

    assert!(pages.iter().all(|page| page.messages().len() <= 2));
    let seen = ids(&pages);
    assert_eq!(seen.len(), 5);
    let expected: HashSet<MessageId> = messages.iter().map(Message::id).collect();
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
}

/// Tests that a channel listing excludes other channels.
#[rstest]
fn channel_listing_is_scoped(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let ours = message_in(channel_id, "hi", &clock).expect("msg");
    let theirs = message_in(ChannelId::new(), "elsewhere", &clock).expect("msg");
    store_all(&rt, &repo, &[ours.clone(), theirs]).expect("store");

    let pages = collect_pages(&rt, &repo, Listing::Channel(channel_id), 10).expect("walk");

    assert_eq!(ids(&pages), vec![ours.id()]);
    let only = pages
        .iter()
        .flat_map(|page| page.messages())
        .next()
        .expect("one message");
    assert_eq!(only.message_text(), "hi");
}

/// Tests that reply listings return replies only and drop deleted ones.
#[rstest]
fn parent_listing_tracks_replies(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let root = message_in(channel_id, "root", &clock).expect("msg");
    let first = reply_to(root.id(), channel_id, "first", &clock).expect("reply");
    let second = reply_to(root.id(), channel_id, "second", &clock).expect("reply");
    store_all(&rt, &repo, &[root.clone(), first.clone(), second.clone()]).expect("store");

    rt.block_on(repo.delete_by_id(first.id())).expect("delete");
    let pages = collect_pages(&rt, &repo, Listing::Parent(root.id()), 10).expect("walk");

    assert_eq!(ids(&pages), vec![second.id()]);
}

/// Tests that an edit is visible through listings without duplicating the
/// index entry.
#[rstest]
fn updated_message_is_listed_once(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
    clock: DefaultClock,
    channel_id: ChannelId,
) {
    let rt = runtime.expect("runtime creation");
    let mut msg = message_in(channel_id, "draft", &clock).expect("msg");
    rt.block_on(repo.insert(&msg)).expect("insert");

    msg.revise(Some("final".to_owned()), &clock);
    rt.block_on(repo.update(&msg)).expect("update");
    let pages = collect_pages(&rt, &repo, Listing::Channel(channel_id), 10).expect("walk");

    let listed: Vec<&Message> = pages.iter().flat_map(|page| page.messages()).collect();
    assert_eq!(listed, vec![&msg]);
}

/// Tests that an empty store lists as a single empty, final page.
#[rstest]
fn empty_store_lists_one_empty_page(runtime: io::Result<Runtime>, repo: MemoryRepository) {
    let rt = runtime.expect("runtime creation");

    let pages = collect_pages(&rt, &repo, Listing::All, 10).expect("walk");

    assert_eq!(pages.len(), 1);
    assert!(pages.iter().all(|page| page.messages().is_empty() && page.is_last()));
}
