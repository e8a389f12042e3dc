//! Event Visibility Filter
//!
//! Applies the evaluator across a candidate set. Storage results are always
//! re-validated here before they reach a caller, so a predicate that is
//! looser than the in-memory rules can never leak an event.

use crate::evaluator::{Action, PermissionEvaluator};
use crate::facts::{Actor, ActorFacts};
use crate::friends::FriendSet;
use convene_core::policy::{Surface, ViewPermission};
use convene_core::{Event, PhysicalTime, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Conjunctive filters layered over the access rules for one discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    /// Surface the results will be shown on
    pub surface: Surface,
    /// Only events starting at or after this time
    #[serde(default)]
    pub starts_after: Option<PhysicalTime>,
    /// Only events in this category
    #[serde(default)]
    pub category: Option<String>,
    /// Only events hosted by this user (profile pages)
    #[serde(default)]
    pub host: Option<UserId>,
}

impl DiscoveryOptions {
    /// Options for a surface with no extra filters.
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            starts_after: None,
            category: None,
            host: None,
        }
    }

    /// Search results.
    pub fn search() -> Self {
        Self::new(Surface::Search)
    }

    /// Feed results.
    pub fn feed() -> Self {
        Self::new(Surface::Feed)
    }

    /// Restrict to events starting at or after `time`.
    pub fn starting_after(mut self, time: PhysicalTime) -> Self {
        self.starts_after = Some(time);
        self
    }

    /// Restrict to one category.
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restrict to one host.
    pub fn hosted_by(mut self, host: UserId) -> Self {
        self.host = Some(host);
        self
    }

    /// Whether `event` passes the non-access filters.
    pub fn admits(&self, event: &Event) -> bool {
        if let Some(bound) = self.starts_after {
            if !event.starts_at.is_some_and(|start| start >= bound) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if event.category.as_ref() != Some(category) {
                return false;
            }
        }
        if let Some(host) = &self.host {
            if event.host.as_ref() != Some(host) {
                return false;
            }
        }
        true
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::search()
    }
}

/// Evaluator applied to sets of events.
#[derive(Debug, Clone, Default)]
pub struct VisibilityFilter {
    evaluator: PermissionEvaluator,
}

impl VisibilityFilter {
    /// Create a filter over `evaluator`.
    pub fn new(evaluator: PermissionEvaluator) -> Self {
        Self { evaluator }
    }

    /// The evaluator in use.
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Derive facts, excluding the event when its record is malformed.
    fn facts_for(event: &Event, actor: &Actor, friends: &FriendSet) -> Option<ActorFacts> {
        match ActorFacts::derive(event, actor, friends) {
            Ok(facts) => Some(facts),
            Err(err) => {
                error!(event_id = %event.id, error = %err, "Excluding malformed event");
                None
            }
        }
    }

    /// Whether `actor` may view `event`, for direct access by link or id.
    pub fn is_visible(&self, event: &Event, actor: &Actor, friends: &FriendSet) -> bool {
        Self::facts_for(event, actor, friends)
            .is_some_and(|facts| self.evaluator.can_view(event, &facts))
    }

    /// Whether `event` may surface for `viewer` on `surface`.
    ///
    /// Staff and attendees always discover events they can view. Everyone
    /// else additionally needs the surface flag, except invitees of an
    /// invite-only tier, who find the events they were invited to.
    pub fn is_discoverable(
        &self,
        event: &Event,
        viewer: &UserId,
        friends: &FriendSet,
        surface: Surface,
    ) -> bool {
        let Some(facts) = Self::facts_for(event, &Actor::User(*viewer), friends) else {
            return false;
        };
        if facts.is_staff() {
            return true;
        }
        let effective = self.evaluator.effective_bundle(event);
        if !PermissionEvaluator::decide_with(&effective, &facts, Action::View).is_allowed() {
            return false;
        }
        facts.is_attendee
            || effective.bundle.appears_on(surface)
            || (facts.is_invited && effective.tier_default.can_view == ViewPermission::Invitees)
    }

    /// Every event in `events` that `actor` may view, in input order.
    pub fn filter_visible(
        &self,
        events: Vec<Event>,
        actor: &Actor,
        friends: &FriendSet,
    ) -> Vec<Event> {
        let total = events.len();
        let visible: Vec<Event> = events
            .into_iter()
            .filter(|event| self.is_visible(event, actor, friends))
            .collect();
        debug!(total, visible = visible.len(), "Filtered events by visibility");
        visible
    }

    /// Every event in `events` discoverable by `viewer` under `options`, in
    /// input order.
    pub fn filter_discoverable(
        &self,
        events: Vec<Event>,
        viewer: &UserId,
        friends: &FriendSet,
        options: &DiscoveryOptions,
    ) -> Vec<Event> {
        let total = events.len();
        let discoverable: Vec<Event> = events
            .into_iter()
            .filter(|event| {
                options.admits(event)
                    && self.is_discoverable(event, viewer, friends, options.surface)
            })
            .collect();
        debug!(
            viewer = %viewer,
            surface = ?options.surface,
            total,
            discoverable = discoverable.len(),
            "Filtered events for discovery"
        );
        discoverable
    }
}
