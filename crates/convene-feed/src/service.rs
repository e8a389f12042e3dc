//! Discovery Service
//!
//! Orchestrates one discovery or feed request over the effect traits:
//!
//! ```text
//! friend graph ─► FriendSet ─► predicate ─► event store
//!                                                │
//!                     page ◄─ ranker ◄─ visibility filter
//! ```
//!
//! Friend-set failures degrade to an empty set; store and clock failures
//! abort the request. Partial results are never returned. Feed pages after
//! the first reuse the clock reading stored in the cursor, so time-window
//! signals do not shift during one traversal.
//!
//! Write-path checks ([`DiscoveryService::authorize`],
//! [`DiscoveryService::join`]) re-read the event and the friend set at call
//! time instead of reusing anything computed earlier in the request.

use crate::config::ConveneConfig;
use crate::pagination::{paginate, FeedCursor, FeedPage};
use crate::ranking::{FeedContext, FeedRanker};
use convene_access::{
    Action, Actor, ActorFacts, DenyReason, DiscoveryOptions, DiscoveryPredicateBuilder,
    FriendSet, JoinOutcome, PermissionEvaluator, VisibilityFilter,
};
use convene_core::effects::{
    EventStoreEffects, FriendGraphEffects, GuestTokenEffects, PhysicalTimeEffects,
};
use convene_core::{ConveneError, ConveneResult, Event, EventId, UserId};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Parameters of one feed request.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    /// Filters applied before ranking
    pub options: DiscoveryOptions,
    /// Encoded cursor from the previous page
    pub cursor: Option<String>,
    /// Page size; must be at least 1
    pub limit: usize,
    /// Categories and tags the viewer follows
    pub affinity: BTreeSet<String>,
    /// Precomputed friend co-attendance, if the caller has it
    pub mutual_counts: Option<BTreeMap<EventId, u32>>,
}

impl Default for FeedRequest {
    fn default() -> Self {
        Self {
            options: DiscoveryOptions::feed(),
            cursor: None,
            limit: DEFAULT_PAGE_SIZE,
            affinity: BTreeSet::new(),
            mutual_counts: None,
        }
    }
}

impl FeedRequest {
    /// Continue from an encoded cursor.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Access-controlled discovery and feed over external collaborators.
pub struct DiscoveryService<G, S, T, C> {
    graph: Arc<G>,
    store: Arc<S>,
    guests: Arc<T>,
    clock: Arc<C>,
    evaluator: PermissionEvaluator,
    filter: VisibilityFilter,
    builder: DiscoveryPredicateBuilder,
    ranker: FeedRanker,
}

impl<G, S, T, C> DiscoveryService<G, S, T, C>
where
    G: FriendGraphEffects,
    S: EventStoreEffects,
    T: GuestTokenEffects,
    C: PhysicalTimeEffects,
{
    /// Create a service; every component shares the one catalog in `config`.
    pub fn new(
        config: ConveneConfig,
        graph: Arc<G>,
        store: Arc<S>,
        guests: Arc<T>,
        clock: Arc<C>,
    ) -> Self {
        let evaluator = PermissionEvaluator::new(config.policy);
        let catalog = evaluator.shared_catalog();
        Self {
            graph,
            store,
            guests,
            clock,
            filter: VisibilityFilter::new(evaluator.clone()),
            builder: DiscoveryPredicateBuilder::new(catalog),
            evaluator,
            ranker: FeedRanker::new(config.ranking),
        }
    }

    /// The evaluator in use.
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Events `viewer` may discover under `options`, unranked.
    pub async fn discover(
        &self,
        viewer: &UserId,
        options: &DiscoveryOptions,
    ) -> ConveneResult<Vec<Event>> {
        let friends = FriendSet::resolve(self.graph.as_ref(), viewer).await;
        self.discover_with(viewer, &friends, options).await
    }

    async fn discover_with(
        &self,
        viewer: &UserId,
        friends: &FriendSet,
        options: &DiscoveryOptions,
    ) -> ConveneResult<Vec<Event>> {
        let predicate = self.builder.build(viewer, friends, options);
        let candidates = self.store.query_events(&predicate).await?;
        let fetched = candidates.len();
        let visible = self
            .filter
            .filter_discoverable(candidates, viewer, friends, options);
        debug!(viewer = %viewer, fetched, visible = visible.len(), "Discovery complete");
        Ok(visible)
    }

    /// One page of `viewer`'s ranked feed.
    pub async fn feed(&self, viewer: &UserId, request: FeedRequest) -> ConveneResult<FeedPage> {
        if request.limit == 0 {
            return Err(ConveneError::invalid("Feed page size must be at least 1"));
        }
        let cursor = request
            .cursor
            .as_deref()
            .map(FeedCursor::decode)
            .transpose()?;

        // Later pages rank with the first page's clock reading.
        let social = futures::future::join(
            FriendSet::resolve(self.graph.as_ref(), viewer),
            self.followed_users(viewer),
        );
        let ((friends, following), cursor) = match cursor {
            Some(cursor) => (social.await, cursor),
            None => {
                let (social, now) = futures::join!(social, self.clock.physical_time());
                (social, FeedCursor::start(now?))
            }
        };
        let now = cursor.as_of;

        let events = self.discover_with(viewer, &friends, &request.options).await?;
        let attending: Vec<EventId> = events
            .iter()
            .filter(|event| event.attendees.contains(viewer))
            .map(|event| event.id)
            .collect();

        let mut context = FeedContext::new(*viewer, friends, now)
            .with_following(following)
            .with_attending(attending)
            .with_affinity(request.affinity);
        context.mutual_counts = request.mutual_counts;

        let ranked = self.ranker.rank(&events, &context);
        let page = paginate(ranked, &cursor, request.limit);
        debug!(
            viewer = %viewer,
            items = page.items.len(),
            more = page.next.is_some(),
            "Feed page served"
        );
        Ok(page)
    }

    /// Users `viewer` follows, or nobody when the graph can't say.
    async fn followed_users(&self, viewer: &UserId) -> Vec<UserId> {
        match self.graph.following(viewer).await {
            Ok(users) => users,
            Err(err) => {
                warn!(viewer = %viewer, error = %err, "Follow list unavailable, ranking without it");
                Vec::new()
            }
        }
    }

    /// Decide `action` on the current state of `event_id`.
    ///
    /// A missing event is a denial. Store and graph failures are errors, and
    /// callers must treat them as a denial too.
    pub async fn authorize(
        &self,
        event_id: &EventId,
        actor: &Actor,
        action: Action,
    ) -> ConveneResult<bool> {
        let Some((event, facts)) = self.current_facts(event_id, actor).await? else {
            return Ok(false);
        };
        let allowed = self.evaluator.evaluate(&event, &facts, action);
        info!(
            event_id = %event_id,
            action = %action,
            allowed,
            "Authorization decided"
        );
        Ok(allowed)
    }

    /// Whether the holder of `token` may view `event_id`.
    pub async fn authorize_guest(&self, token: &str, event_id: &EventId) -> ConveneResult<bool> {
        let Some(grant) = self.guests.validate_guest_token(token).await else {
            debug!(event_id = %event_id, "Guest token rejected");
            return Ok(false);
        };
        self.authorize(event_id, &Actor::Guest(grant), Action::View).await
    }

    /// What a join by `user` would do against the current event state.
    pub async fn join(&self, event_id: &EventId, user: &UserId) -> ConveneResult<JoinOutcome> {
        let actor = Actor::User(*user);
        let Some((event, facts)) = self.current_facts(event_id, &actor).await? else {
            return Ok(JoinOutcome::Denied(DenyReason::NotPermitted));
        };
        Ok(self.evaluator.join_outcome(&event, &facts))
    }

    async fn current_facts(
        &self,
        event_id: &EventId,
        actor: &Actor,
    ) -> ConveneResult<Option<(Event, ActorFacts)>> {
        let Some(event) = self.store.get_event(event_id).await? else {
            debug!(event_id = %event_id, "Event not found");
            return Ok(None);
        };
        let friends = match actor.user_id() {
            Some(user) => FriendSet::fetch(self.graph.as_ref(), user).await?,
            None => FriendSet::empty(),
        };
        let facts = ActorFacts::derive(&event, actor, &friends)?;
        Ok(Some((event, facts)))
    }
}
