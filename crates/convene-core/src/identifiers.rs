//! Identifier types
//!
//! Opaque UUID-backed identifiers for the two entities the access engine
//! reasons about: users and events. Both render with a short type prefix
//! (`user-…`, `event-…`) and parse either the prefixed or the raw form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from caller-provided entropy.
            pub fn new_from_entropy(entropy: [u8; 32]) -> Self {
                let mut uuid_bytes = [0u8; 16];
                uuid_bytes.copy_from_slice(&entropy[..16]);
                Self(Uuid::from_bytes(uuid_bytes))
            }

            /// Create from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(raw)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_identifier!(
    /// Platform account identifier.
    ///
    /// Guest-token holders have no `UserId`; they are represented by
    /// [`GuestIdentity`](crate::effects::GuestIdentity) instead.
    UserId,
    "user"
);

uuid_identifier!(
    /// Event identifier.
    EventId,
    "event"
);
