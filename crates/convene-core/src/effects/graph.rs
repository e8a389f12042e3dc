//! Friend graph effects
//!
//! Friendships are stored as two directed records. Once accepted, both
//! directions should read `Accepted`, but nothing upstream guarantees it, so
//! callers confirm the reverse edge instead of assuming symmetry.

use crate::identifiers::UserId;
use crate::ConveneError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors reported by a friend graph backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Backend could not be reached or timed out
    #[error("friend graph unavailable: {reason}")]
    Unavailable {
        /// Backend-provided reason
        reason: String,
    },
    /// Backend returned data that could not be decoded
    #[error("friend graph returned malformed data: {reason}")]
    Malformed {
        /// Backend-provided reason
        reason: String,
    },
}

impl From<GraphError> for ConveneError {
    fn from(err: GraphError) -> Self {
        ConveneError::upstream_fetch("friend-graph", err.to_string())
    }
}

/// State of one directed friendship record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    /// Request sent, not yet accepted
    Pending,
    /// Accepted
    Accepted,
}

/// One directed friendship record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEdge {
    /// Owner of the record
    pub from: UserId,
    /// The other party
    pub to: UserId,
    /// Current status
    pub status: EdgeStatus,
    /// Who sent the original request
    pub initiated_by: UserId,
}

impl FriendEdge {
    /// Whether this record reads as an accepted friendship.
    pub fn is_accepted(&self) -> bool {
        self.status == EdgeStatus::Accepted
    }
}

/// Read-only view of the friend/follow graph.
#[async_trait]
pub trait FriendGraphEffects: Send + Sync {
    /// Users whose record from `user` is accepted.
    async fn accepted_friends(&self, user: &UserId) -> Result<Vec<UserId>, GraphError>;

    /// The directed record from `from` to `to`, if any.
    async fn friend_edge(
        &self,
        from: &UserId,
        to: &UserId,
    ) -> Result<Option<FriendEdge>, GraphError>;

    /// Users `user` follows. Legacy signal read only as a feed ranking hint;
    /// access decisions use accepted friendships alone.
    async fn following(&self, user: &UserId) -> Result<Vec<UserId>, GraphError>;
}
