//! Identifier newtypes for messages, channels and authors.
//!
//! These types wrap UUIDs so that a channel identifier can never be passed
//! where a message identifier is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Declares a UUID-backed identifier with random construction, parsing and
/// transparent serialization.
macro_rules! uuid_id {
    ($name:ident, $noun:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random ", $noun, " identifier.")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Creates a ", $noun, " identifier from an existing UUID.")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID value.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        /// Each call mints a fresh random identifier.
        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    MessageId,
    "message",
    "Unique identifier for a stored message.\n\n\
     # Examples\n\n\
     ```\n\
     use message_service::message::domain::MessageId;\n\n\
     let id = MessageId::new();\n\
     assert!(!id.as_ref().is_nil());\n\
     ```"
);

uuid_id!(
    ChannelId,
    "channel",
    "Identifier of the channel that owns a message."
);

uuid_id!(
    UserId,
    "user",
    "Identifier of the user who authored a message."
);
