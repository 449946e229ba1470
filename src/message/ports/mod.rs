//! Port trait definitions for the message subsystem.
//!
//! Ports define the abstract interfaces that the service layer requires from
//! infrastructure. Adapters implement these ports to connect the domain to
//! stores and queues.

pub mod key_value;
pub mod publisher;
pub mod repository;

pub use key_value::{IndexScan, KeyValueStore};
pub use publisher::{MessagePublisher, PublishError, PublishResult};
pub use repository::{MessageRepository, RepositoryResult};
