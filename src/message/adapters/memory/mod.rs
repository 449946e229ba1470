//! In-memory adapter implementations for testing.
//!
//! These adapters provide simple, thread-safe implementations suitable for
//! unit testing and single-process runs without a store or broker.

mod key_value_store;
mod publisher;

pub use key_value_store::InMemoryKeyValueStore;
pub use publisher::RecordingPublisher;
