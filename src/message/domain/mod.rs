//! Domain types for the message subsystem.
//!
//! Pure types with no infrastructure dependencies: the message aggregate,
//! its published projection, identifier newtypes and pagination values.

mod error;
mod ids;
mod message;
mod page;
mod projection;

pub use error::MessageDomainError;
pub use ids::{ChannelId, MessageId, UserId};
pub use message::{Message, MessageDraft, PersistedMessageData};
pub use page::{Cursor, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MessagePage, PageRequest};
pub use projection::MessageProjection;
