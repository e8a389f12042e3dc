//! Unified error type for Convene
//!
//! Every access decision resolves to allow or deny. Errors never carry an
//! implicit "allow": callers that receive `Err` must treat the request as
//! denied, and [`ConveneError::is_server_error`] tells the route layer when
//! the failure is a data or upstream problem rather than a plain refusal.

use crate::identifiers::EventId;
use serde::{Deserialize, Serialize};

/// Unified error type for all Convene operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ConveneError {
    /// Unknown tier or permission value reached evaluation
    #[error("Policy configuration error: {message}")]
    PolicyConfiguration {
        /// Which value was not recognized and where
        message: String,
    },

    /// Friend graph, event store or another collaborator failed
    #[error("Upstream fetch from {source_name} failed: {message}")]
    UpstreamFetch {
        /// Collaborator that failed ("friend-graph", "event-store", ...)
        source_name: String,
        /// Error message reported by the collaborator
        message: String,
    },

    /// Actor facts could not be derived because the event record is malformed
    #[error("Invalid actor state for {event_id}: {message}")]
    InvalidActorState {
        /// Event whose record is malformed
        event_id: EventId,
        /// What is missing or inconsistent
        message: String,
    },

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },
}

impl ConveneError {
    /// Create a policy configuration error
    pub fn policy_configuration(message: impl Into<String>) -> Self {
        Self::PolicyConfiguration {
            message: message.into(),
        }
    }

    /// Create an upstream fetch error
    pub fn upstream_fetch(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid actor state error
    pub fn invalid_actor_state(event_id: EventId, message: impl Into<String>) -> Self {
        Self::InvalidActorState {
            event_id,
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Whether the route layer should report this as a server-side failure
    /// instead of an access refusal.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFetch { .. } | Self::InvalidActorState { .. }
        )
    }
}

/// Standard result type for Convene operations
pub type ConveneResult<T> = Result<T, ConveneError>;
