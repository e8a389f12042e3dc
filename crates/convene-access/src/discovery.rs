//! Discovery Predicate Builder
//!
//! Translates the discoverability rule into a [`Predicate`] a storage
//! adapter can push down. Per-tier clauses are generated from the same
//! [`PolicyCatalog`] the evaluator reads, so the predicate and the in-memory
//! filter can't drift apart when a preset changes.
//!
//! Shape of the result:
//!
//! ```text
//! host IS NOT NULL
//! AND (  host = me
//!     OR co_hosts ∋ me
//!     OR (attendees ∋ me AND <tier recognized, view override recognized>)
//!     OR for each tier T: (tier = T AND <view rule of T> AND <surface rule of T>) )
//! AND <discovery options>
//! ```
//!
//! Per-event view overrides are expanded over every recognized level, so an
//! override that narrows a tier default is honoured in storage, and an
//! unrecognized override matches no clause at all.

use crate::catalog::PolicyCatalog;
use crate::friends::FriendSet;
use crate::visibility::DiscoveryOptions;
use convene_core::policy::{PermissionBundle, PrivacyTier, Surface, ViewPermission};
use convene_core::predicate::{Field, Predicate, Value};
use convene_core::UserId;
use std::sync::Arc;
use tracing::debug;

/// Builds storage predicates from the policy catalog.
#[derive(Debug, Clone)]
pub struct DiscoveryPredicateBuilder {
    catalog: Arc<PolicyCatalog>,
}

impl DiscoveryPredicateBuilder {
    /// Create a builder over `catalog`.
    pub fn new(catalog: Arc<PolicyCatalog>) -> Self {
        Self { catalog }
    }

    /// Predicate matching every event `viewer` may discover under `options`.
    ///
    /// `friends` must already be resolved; pass an empty set when the graph
    /// could not be read.
    pub fn build(
        &self,
        viewer: &UserId,
        friends: &FriendSet,
        options: &DiscoveryOptions,
    ) -> Predicate {
        let me = Value::User(*viewer);

        let mut reachable = vec![
            Predicate::equals(Field::Host, me.clone()),
            Predicate::contains(Field::CoHosts, me.clone()),
            self.attendee_clause(viewer),
        ];
        for (tier, bundle) in self.catalog.tiers() {
            reachable.push(tier_clause(&tier, bundle, viewer, friends, options.surface));
        }

        let mut parts = vec![
            Predicate::negate(Predicate::is_null(Field::Host)),
            Predicate::or(reachable),
        ];
        parts.extend(option_clauses(options));

        let predicate = Predicate::and(parts);
        debug!(
            viewer = %viewer,
            surface = ?options.surface,
            friends = friends.len(),
            "Built discovery predicate"
        );
        predicate
    }

    /// Attendees discover any event they can view, which is every event whose
    /// effective view permission is recognized.
    fn attendee_clause(&self, viewer: &UserId) -> Predicate {
        let known_levels: Vec<Value> = ViewPermission::known()
            .iter()
            .map(|level| Value::text(level.as_str()))
            .collect();
        let override_recognized = Predicate::or([
            Predicate::is_null(Field::ViewOverride),
            Predicate::is_in(Field::ViewOverride, known_levels),
        ]);

        let viewable_tiers = self
            .catalog
            .tiers()
            .into_iter()
            .filter(|(_, bundle)| bundle.can_view.is_recognized())
            .map(|(tier, _)| tier_equals(&tier));

        Predicate::and([
            Predicate::contains(Field::Attendees, Value::User(*viewer)),
            Predicate::or(viewable_tiers),
            override_recognized,
        ])
    }
}

impl Default for DiscoveryPredicateBuilder {
    fn default() -> Self {
        Self::new(Arc::new(PolicyCatalog::presets()))
    }
}

fn tier_equals(tier: &PrivacyTier) -> Predicate {
    Predicate::equals(Field::Tier, Value::text(tier.as_str()))
}

/// Events of one tier that a non-staff, non-attending viewer discovers.
fn tier_clause(
    tier: &PrivacyTier,
    bundle: &PermissionBundle,
    viewer: &UserId,
    friends: &FriendSet,
    surface: Surface,
) -> Predicate {
    if !bundle.can_view.is_recognized() {
        return Predicate::never();
    }
    Predicate::and([
        tier_equals(tier),
        view_with_overrides(&bundle.can_view, viewer, friends),
        surface_clause(bundle, viewer, surface),
    ])
}

/// The tier's view rule, narrowed by whatever override the row carries.
fn view_with_overrides(
    default: &ViewPermission,
    viewer: &UserId,
    friends: &FriendSet,
) -> Predicate {
    let mut branches = vec![Predicate::and([
        Predicate::is_null(Field::ViewOverride),
        view_clause(default, viewer, friends),
    ])];
    for level in ViewPermission::known() {
        let effective = default.narrowed_by(Some(&level));
        branches.push(Predicate::and([
            Predicate::equals(Field::ViewOverride, Value::text(level.as_str())),
            view_clause(&effective, viewer, friends),
        ]));
    }
    Predicate::or(branches)
}

fn view_clause(permission: &ViewPermission, viewer: &UserId, friends: &FriendSet) -> Predicate {
    match permission {
        ViewPermission::Anyone => Predicate::always(),
        ViewPermission::Followers => {
            Predicate::is_in(Field::Host, friends.iter().copied().map(Value::User).collect())
        }
        ViewPermission::Invitees => Predicate::contains(Field::InvitedUsers, Value::User(*viewer)),
        ViewPermission::HostOnly | ViewPermission::Unrecognized(_) => Predicate::never(),
    }
}

/// Surface flag of the tier, which a per-event override may switch off, or
/// the invitation exception for invite-only tiers.
fn surface_clause(bundle: &PermissionBundle, viewer: &UserId, surface: Surface) -> Predicate {
    let flag = if bundle.appears_on(surface) {
        Predicate::negate(Predicate::equals(
            Field::surface_override(surface),
            Value::Bool(false),
        ))
    } else {
        Predicate::never()
    };
    let invited = if bundle.can_view == ViewPermission::Invitees {
        Predicate::contains(Field::InvitedUsers, Value::User(*viewer))
    } else {
        Predicate::never()
    };
    Predicate::or([flag, invited])
}

fn option_clauses(options: &DiscoveryOptions) -> Vec<Predicate> {
    let mut clauses = Vec::new();
    if let Some(bound) = options.starts_after {
        clauses.push(Predicate::at_least(Field::StartsAt, Value::Time(bound)));
    }
    if let Some(category) = &options.category {
        clauses.push(Predicate::equals(Field::Category, Value::text(category.clone())));
    }
    if let Some(host) = options.host {
        clauses.push(Predicate::equals(Field::Host, Value::User(host)));
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use convene_core::policy::PermissionOverrides;
    use convene_core::{Event, EventId, PhysicalTime};

    fn user(seed: u8) -> UserId {
        UserId::new_from_entropy([seed; 32])
    }

    fn event(seed: u8, host: u8, tier: PrivacyTier) -> Event {
        Event::new(EventId::new_from_entropy([seed; 32]), user(host), tier)
    }

    #[test]
    fn test_public_events_match_strangers() {
        let builder = DiscoveryPredicateBuilder::default();
        let p = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::search());
        assert!(p.matches(&event(1, 1, PrivacyTier::Public)));
        assert!(!p.matches(&event(2, 1, PrivacyTier::Friends)));
        assert!(!p.matches(&event(3, 1, PrivacyTier::Private)));
    }

    #[test]
    fn test_friends_tier_uses_friend_set() {
        let builder = DiscoveryPredicateBuilder::default();
        let friends: FriendSet = [user(1)].into_iter().collect();
        let p = builder.build(&user(9), &friends, &DiscoveryOptions::feed());
        assert!(p.matches(&event(1, 1, PrivacyTier::Friends)));
        assert!(!p.matches(&event(2, 2, PrivacyTier::Friends)));
    }

    #[test]
    fn test_roles_match_any_tier_they_can_view() {
        let builder = DiscoveryPredicateBuilder::default();
        let p = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::search());
        assert!(p.matches(&event(1, 9, PrivacyTier::Private)));
        assert!(p.matches(&event(2, 1, PrivacyTier::parse("secret")).with_co_host(user(9))));
        assert!(p.matches(&event(3, 1, PrivacyTier::Private).with_attendee(user(9))));
        assert!(p.matches(&event(4, 1, PrivacyTier::Private).with_invited(user(9))));
        assert!(!p.matches(&event(5, 1, PrivacyTier::parse("secret")).with_attendee(user(9))));
    }

    #[test]
    fn test_view_override_narrows_in_storage() {
        let builder = DiscoveryPredicateBuilder::default();
        let p = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::search());
        let narrowed = event(1, 1, PrivacyTier::Public).with_overrides(PermissionOverrides {
            can_view: Some(ViewPermission::Followers),
            ..PermissionOverrides::default()
        });
        assert!(!p.matches(&narrowed));

        let bogus = event(2, 1, PrivacyTier::Public).with_overrides(PermissionOverrides {
            can_view: Some(ViewPermission::parse("everyone")),
            ..PermissionOverrides::default()
        });
        assert!(!p.matches(&bogus));
    }

    #[test]
    fn test_surface_opt_out() {
        let builder = DiscoveryPredicateBuilder::default();
        let opted_out = event(1, 1, PrivacyTier::Public).with_overrides(PermissionOverrides {
            appear_in_feed: Some(false),
            ..PermissionOverrides::default()
        });
        let feed = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::feed());
        let search = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::search());
        assert!(!feed.matches(&opted_out));
        assert!(search.matches(&opted_out));
    }

    #[test]
    fn test_missing_host_never_matches() {
        let builder = DiscoveryPredicateBuilder::default();
        let p = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::search());
        let mut broken = event(1, 1, PrivacyTier::Public);
        broken.host = None;
        assert!(!p.matches(&broken));
    }

    #[test]
    fn test_options_are_conjunctive() {
        let builder = DiscoveryPredicateBuilder::default();
        let options = DiscoveryOptions::search()
            .starting_after(PhysicalTime::from_millis(10))
            .in_category("food")
            .hosted_by(user(1));
        let p = builder.build(&user(9), &FriendSet::empty(), &options);
        let matching = event(1, 1, PrivacyTier::Public)
            .starting_at(PhysicalTime::from_millis(10))
            .in_category("food");
        assert!(p.matches(&matching));
        assert!(!p.matches(&matching.clone().in_category("art")));
        assert!(!p.matches(&event(2, 2, PrivacyTier::Public)
            .starting_at(PhysicalTime::from_millis(10))
            .in_category("food")));
    }

    #[test]
    fn test_catalog_change_reaches_predicate() {
        let mut catalog = PolicyCatalog::presets();
        catalog.public.appear_in_search = false;
        let builder = DiscoveryPredicateBuilder::new(Arc::new(catalog));
        let p = builder.build(&user(9), &FriendSet::empty(), &DiscoveryOptions::search());
        assert!(!p.matches(&event(1, 1, PrivacyTier::Public)));
    }
}
