//! Service flow tests over the in-memory store.
//!
//! Drives `MessageService` end to end: create-then-publish, edits and
//! channel listings.

use crate::in_memory::helpers::{MemoryRepository, repo, runtime};
use async_trait::async_trait;
use message_service::message::{
    adapters::memory::RecordingPublisher,
    domain::{ChannelId, MessageProjection, PageRequest, UserId},
    ports::{MessagePublisher, PublishError, PublishResult},
    services::{CreateMessageRequest, ErrorKind, MessageService, UpdateMessageRequest},
};
use mockable::DefaultClock;
use rstest::rstest;
use std::io;
use std::sync::Arc;
use tokio::runtime::Runtime;

struct DownBroker;

#[async_trait]
impl MessagePublisher for DownBroker {
    async fn publish(&self, _projection: &MessageProjection) -> PublishResult<()> {
        Err(PublishError::connection(io::Error::other("connection refused")))
    }
}

/// Tests the create-then-list scenario for a single channel.
#[rstest]
fn created_message_is_listed_in_its_channel(
    runtime: io::Result<Runtime>,
    repo: MemoryRepository,
) {
    let rt = runtime.expect("runtime creation");
    let publisher = RecordingPublisher::new();
    let service = MessageService::new(Arc::new(repo), Arc::new(DefaultClock))
        .with_publisher(Arc::new(publisher.clone()));
    let channel = ChannelId::new();
    let user = UserId::new();

    let created = rt
        .block_on(service.create(CreateMessageRequest::new(channel, user, "hi")))
        .expect("create");
    let page = PageRequest::first(10).expect("page");
    let listed = rt
        .block_on(service.list_by_channel(channel, &page))
        .expect("list");

    assert_eq!(created.channel_id(), channel);
    assert_eq!(listed.messages(), [created.clone()].as_slice());
    assert_eq!(publisher.published(), vec![created.projection()]);
}

/// Tests that a failed publish fails the create while the record survives.
#[rstest]
fn publish_failure_leaves_record_behind(runtime: io::Result<Runtime>, repo: MemoryRepository) {
    let rt = runtime.expect("runtime creation");
    let repository = Arc::new(repo);
    let service = MessageService::new(Arc::clone(&repository), Arc::new(DefaultClock))
        .with_publisher(Arc::new(DownBroker));

    let result = rt.block_on(service.create(CreateMessageRequest::new(
        ChannelId::new(),
        UserId::new(),
        "orphan",
    )));

    let err = result.expect_err("publish fails");
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(repository.store().len(), 1);
}

/// Tests that an edit without text keeps the text and moves `updated_at`.
#[rstest]
fn empty_edit_only_touches_timestamp(runtime: io::Result<Runtime>, repo: MemoryRepository) {
    let rt = runtime.expect("runtime creation");
    let service = MessageService::new(Arc::new(repo), Arc::new(DefaultClock));
    let created = rt
        .block_on(service.create(CreateMessageRequest::new(
            ChannelId::new(),
            UserId::new(),
            "keep",
        )))
        .expect("create");

    let updated = rt
        .block_on(service.update(created.id(), UpdateMessageRequest::new()))
        .expect("update");

    assert_eq!(updated.message_text(), "keep");
    assert!(updated.updated_at() >= created.updated_at());
    assert_eq!(updated.created_at(), created.created_at());
    let fetched = rt.block_on(service.get(created.id())).expect("get");
    assert_eq!(fetched, updated);
}
