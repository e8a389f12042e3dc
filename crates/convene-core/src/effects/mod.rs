//! Effect traits for external collaborators
//!
//! The access engine never performs I/O itself. Everything it needs from the
//! outside world comes through these traits, fetched once at the start of a
//! request:
//!
//! - [`FriendGraphEffects`]: accepted friendships and legacy follows
//! - [`EventStoreEffects`]: predicate queries and single-event reads
//! - [`GuestTokenEffects`]: validation of signed guest-access tokens
//! - [`PhysicalTimeEffects`]: the request's notion of "now"

pub mod graph;
pub mod guest;
pub mod store;
pub mod time;

pub use graph::{EdgeStatus, FriendEdge, FriendGraphEffects, GraphError};
pub use guest::{GuestGrant, GuestIdentity, GuestTokenEffects};
pub use store::{EventStoreEffects, StoreError};
pub use time::{ClockError, PhysicalTimeEffects, SystemClock};
