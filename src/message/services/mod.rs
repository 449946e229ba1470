//! Application services for the message subsystem.
//!
//! Services orchestrate domain operations and coordinate between ports,
//! implementing the create-then-publish workflow over any repository.

mod messages;


pub use messages::{
    CreateMessageRequest, ErrorKind, MessageService, MessageServiceError, MessageServiceResult,
    UpdateMessageRequest,
};
