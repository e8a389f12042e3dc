//! Guest token effects
//!
//! A guest token lets someone without an account view exactly one event.
//! The token itself is signed and time-limited by the adapter; the engine
//! only ever sees the validated grant.

use crate::identifiers::EventId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity recorded in a guest token (typically the invitee's email or name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestIdentity(pub String);

impl fmt::Display for GuestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "guest:{}", self.0)
    }
}

/// A validated guest token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestGrant {
    /// The single event this grant covers
    pub event_id: EventId,
    /// Who the token was issued to
    pub guest: GuestIdentity,
}

impl GuestGrant {
    /// Whether this grant covers `event_id`.
    pub fn covers(&self, event_id: &EventId) -> bool {
        &self.event_id == event_id
    }
}

/// Validates signed, time-limited guest tokens.
#[async_trait]
pub trait GuestTokenEffects: Send + Sync {
    /// The grant carried by `token`, or `None` when it is invalid or expired.
    async fn validate_guest_token(&self, token: &str) -> Option<GuestGrant>;
}
