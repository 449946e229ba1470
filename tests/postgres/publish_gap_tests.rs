//! Create-then-publish tests over `PostgreSQL`.
//!
//! The insert and the publish are not atomic: a publish failure fails the
//! create but leaves the row in place.

use crate::postgres::helpers::{PgTestContext, pg_context};
use async_trait::async_trait;
use message_service::message::{
    adapters::memory::RecordingPublisher,
    domain::{ChannelId, MessageProjection, PageRequest, UserId},
    ports::{MessagePublisher, PublishError, PublishResult, repository::MessageRepository},
    services::{CreateMessageRequest, MessageService, MessageServiceError},
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

struct NackingBroker;

#[async_trait]
impl MessagePublisher for NackingBroker {
    async fn publish(&self, _projection: &MessageProjection) -> PublishResult<()> {
        Err(PublishError::publish(
            "message",
            std::io::Error::other("negative acknowledgement"),
        ))
    }
}

#[rstest]
fn publish_failure_keeps_the_row(#[from(pg_context)] context: PgTestContext) {
    let repository = Arc::new(context.repo.clone());
    let service = MessageService::new(Arc::clone(&repository), Arc::new(DefaultClock))
        .with_publisher(Arc::new(NackingBroker));

    let result = context.rt.block_on(service.create(CreateMessageRequest::new(
        ChannelId::new(),
        UserId::new(),
        "orphan",
    )));

    let Err(MessageServiceError::Publish { message_id, .. }) = result else {
        panic!("expected publish failure, got {result:?}");
    };
    let stored = context
        .rt
        .block_on(repository.find_by_id(message_id))
        .expect("row survives the failed publish");
    assert_eq!(stored.message_text(), "orphan");
    drop(service);
    drop(repository);
    context.cleanup();
}

#[rstest]
fn successful_create_publishes_and_lists(#[from(pg_context)] context: PgTestContext) {
    let publisher = RecordingPublisher::new();
    let service = MessageService::new(Arc::new(context.repo.clone()), Arc::new(DefaultClock))
        .with_publisher(Arc::new(publisher.clone()));
    let channel = ChannelId::new();

    let created = context
        .rt
        .block_on(service.create(CreateMessageRequest::new(channel, UserId::new(), "hi")))
        .expect("create");
    let listed = context
        .rt
        .block_on(service.list_by_channel(channel, &PageRequest::first(10).expect("size")))
        .expect("list");

    assert_eq!(listed.messages(), [created.clone()].as_slice());
    assert_eq!(publisher.published(), vec![created.projection()]);
    drop(service);
    context.cleanup();
}
