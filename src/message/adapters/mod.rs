//! Persistence and publishing adapters for the message module.
//!
//! This module provides concrete implementations of the ports, following
//! hexagonal architecture principles. Adapters handle all infrastructure
//! concerns while the domain remains pure.
//!
//! # Available Adapters
//!
//! - [`key_value::KeyValueMessageRepository`]: message records plus set
//!   indexes over any [`KeyValueStore`]
//! - [`redis_store::RedisKeyValueStore`]: Redis-backed [`KeyValueStore`]
//! - [`memory::InMemoryKeyValueStore`]: thread-safe in-memory
//!   [`KeyValueStore`] for tests
//! - [`postgres::PostgresMessageRepository`]: `PostgreSQL` persistence using
//!   Diesel ORM
//! - [`amqp::AmqpMessagePublisher`]: durable-queue publisher using `lapin`
//! - [`memory::RecordingPublisher`]: in-memory publisher for tests
//!
//! [`KeyValueStore`]: crate::message::ports::key_value::KeyValueStore

pub mod amqp;
pub mod key_value;
pub mod memory;
pub mod postgres;
pub mod redis_store;
