//! In-memory collaborators
//!
//! Reference adapters for the effect traits, backed by `tokio` locks. The
//! event store answers queries with [`Predicate::matches`], which makes it
//! the yardstick other storage adapters are compared against. Useful for
//! tests and for embedding the engine without a database.

use async_trait::async_trait;
use convene_core::effects::{
    EdgeStatus, EventStoreEffects, FriendEdge, FriendGraphEffects, GraphError, GuestGrant,
    GuestTokenEffects, StoreError,
};
use convene_core::{Event, EventId, Predicate, UserId};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Event collection held in memory.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<BTreeMap<EventId, Event>>,
}

impl MemoryEventStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `events`.
    pub fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: RwLock::new(events.into_iter().map(|e| (e.id, e)).collect()),
        }
    }

    /// Insert or replace an event.
    pub async fn insert(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }

    /// Remove an event.
    pub async fn remove(&self, id: &EventId) -> Option<Event> {
        self.events.write().await.remove(id)
    }

    /// Apply `update` to a stored event, returning whether it existed.
    pub async fn update<F>(&self, id: &EventId, update: F) -> bool
    where
        F: FnOnce(&mut Event),
    {
        match self.events.write().await.get_mut(id) {
            Some(event) => {
                update(event);
                true
            }
            None => false,
        }
    }

    /// Number of stored events.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventStoreEffects for MemoryEventStore {
    async fn query_events(&self, predicate: &Predicate) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        Ok(events
            .values()
            .filter(|event| predicate.matches(event))
            .cloned()
            .collect())
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(id).cloned())
    }
}

/// Friend graph held in memory as directed records.
#[derive(Debug, Default)]
pub struct MemoryFriendGraph {
    edges: RwLock<BTreeMap<(UserId, UserId), FriendEdge>>,
    follows: RwLock<BTreeMap<UserId, BTreeSet<UserId>>>,
}

impl MemoryFriendGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one directed record.
    pub async fn insert_edge(&self, edge: FriendEdge) {
        self.edges.write().await.insert((edge.from, edge.to), edge);
    }

    /// Record an accepted friendship in both directions.
    pub async fn befriend(&self, a: UserId, b: UserId) {
        let mut edges = self.edges.write().await;
        for (from, to) in [(a, b), (b, a)] {
            edges.insert(
                (from, to),
                FriendEdge {
                    from,
                    to,
                    status: EdgeStatus::Accepted,
                    initiated_by: a,
                },
            );
        }
    }

    /// Remove a friendship in both directions.
    pub async fn unfriend(&self, a: &UserId, b: &UserId) {
        let mut edges = self.edges.write().await;
        edges.remove(&(*a, *b));
        edges.remove(&(*b, *a));
    }

    /// Record that `follower` follows `followee`.
    pub async fn follow(&self, follower: UserId, followee: UserId) {
        self.follows
            .write()
            .await
            .entry(follower)
            .or_default()
            .insert(followee);
    }
}

#[async_trait]
impl FriendGraphEffects for MemoryFriendGraph {
    async fn accepted_friends(&self, user: &UserId) -> Result<Vec<UserId>, GraphError> {
        let edges = self.edges.read().await;
        Ok(edges
            .values()
            .filter(|edge| edge.from == *user && edge.is_accepted())
            .map(|edge| edge.to)
            .collect())
    }

    async fn friend_edge(
        &self,
        from: &UserId,
        to: &UserId,
    ) -> Result<Option<FriendEdge>, GraphError> {
        Ok(self.edges.read().await.get(&(*from, *to)).cloned())
    }

    async fn following(&self, user: &UserId) -> Result<Vec<UserId>, GraphError> {
        Ok(self
            .follows
            .read()
            .await
            .get(user)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}

/// Guest tokens issued in memory. Tokens are opaque strings.
#[derive(Debug, Default)]
pub struct MemoryGuestTokens {
    grants: RwLock<HashMap<String, GuestGrant>>,
}

impl MemoryGuestTokens {
    /// No tokens issued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as granting `grant`.
    pub async fn issue(&self, token: impl Into<String>, grant: GuestGrant) {
        self.grants.write().await.insert(token.into(), grant);
    }

    /// Invalidate `token`.
    pub async fn revoke(&self, token: &str) {
        self.grants.write().await.remove(token);
    }
}

#[async_trait]
impl GuestTokenEffects for MemoryGuestTokens {
    async fn validate_guest_token(&self, token: &str) -> Option<GuestGrant> {
        self.grants.read().await.get(token).cloned()
    }
}
