//! Message service: chat-message storage over Redis or `PostgreSQL`.
//!
//! This crate stores, edits and lists chat messages through a single
//! repository contract with interchangeable backends, and announces newly
//! created messages on an AMQP queue.
//!
//! # Architecture
//!
//! The message subsystem follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`message`]: Message model, repositories, publisher and service
//! - [`http`]: Axum router exposing the service
//! - [`config`]: Environment-driven settings
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod http;
pub mod message;
pub mod telemetry;
