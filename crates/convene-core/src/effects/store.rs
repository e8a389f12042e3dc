//! Event store effects

use crate::event::Event;
use crate::identifiers::EventId;
use crate::predicate::Predicate;
use crate::ConveneError;
use async_trait::async_trait;

/// Errors reported by an event store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or timed out
    #[error("event store unavailable: {reason}")]
    Unavailable {
        /// Backend-provided reason
        reason: String,
    },
    /// The adapter cannot express part of the predicate
    #[error("predicate not supported by adapter: {reason}")]
    UnsupportedPredicate {
        /// What could not be translated
        reason: String,
    },
}

impl From<StoreError> for ConveneError {
    fn from(err: StoreError) -> Self {
        ConveneError::upstream_fetch("event-store", err.to_string())
    }
}

/// Storage adapter over the event collection.
///
/// Adapters must interpret every [`Predicate`] exactly as
/// [`Predicate::matches`] does. Returning extra rows is tolerated (results
/// are re-validated); dropping matching rows is a bug.
#[async_trait]
pub trait EventStoreEffects: Send + Sync {
    /// Events matching `predicate`, in any order.
    async fn query_events(&self, predicate: &Predicate) -> Result<Vec<Event>, StoreError>;

    /// The current record for one event.
    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, StoreError>;
}
