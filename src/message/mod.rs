//! Message storage with interchangeable key-value and relational backends.
//!
//! # Architecture
//!
//! The module follows hexagonal architecture principles:
//!
//! - **Domain**: pure types ([`domain::Message`], [`domain::MessageProjection`],
//!   [`domain::PageRequest`], [`domain::MessagePage`])
//! - **Ports**: abstract interfaces ([`ports::MessageRepository`],
//!   [`ports::KeyValueStore`], [`ports::MessagePublisher`])
//! - **Adapters**: Redis, `PostgreSQL`, AMQP and in-memory implementations
//! - **Services**: [`services::MessageService`], the create-then-publish
//!   workflow written once over any repository
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use message_service::message::adapters::key_value::KeyValueMessageRepository;
//! use message_service::message::adapters::memory::InMemoryKeyValueStore;
//! use message_service::message::domain::{ChannelId, PageRequest, UserId};
//! use message_service::message::services::{CreateMessageRequest, MessageService};
//! use mockable::DefaultClock;
//!
//! # tokio_test();
//! # fn tokio_test() {
//! let runtime = tokio::runtime::Runtime::new().expect("runtime");
//! runtime.block_on(async {
//!     let repository = Arc::new(KeyValueMessageRepository::new(InMemoryKeyValueStore::new()));
//!     let service = MessageService::new(repository, Arc::new(DefaultClock));
//!
//!     let channel = ChannelId::new();
//!     service
//!         .create(CreateMessageRequest::new(channel, UserId::new(), "hi"))
//!         .await
//!         .expect("message created");
//!
//!     let page = PageRequest::first(10).expect("valid page size");
//!     let listed = service.list_by_channel(channel, &page).await.expect("listed");
//!     assert_eq!(listed.messages().len(), 1);
//! });
//! # }
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
