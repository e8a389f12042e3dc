//! Property tests for access decisions and discovery predicates.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use convene_access::{
    Action, ActorFacts, DiscoveryOptions, DiscoveryPredicateBuilder, FriendSet,
    PermissionEvaluator, PolicyCatalog, VisibilityFilter,
};
use convene_core::policy::{
    InvitePermission, JoinPermission, PermissionOverrides, SharePermission, Surface,
    ViewPermission,
};
use convene_core::{Event, EventId, PhysicalTime, PrivacyTier, UserId};
use proptest::prelude::*;
use std::sync::Arc;

fn user(seed: u8) -> UserId {
    UserId::new_from_entropy([seed; 32])
}

fn arb_user() -> impl Strategy<Value = UserId> {
    (0u8..6).prop_map(user)
}

fn arb_users() -> impl Strategy<Value = Vec<UserId>> {
    prop::collection::vec(arb_user(), 0..4)
}

fn arb_tier() -> impl Strategy<Value = PrivacyTier> {
    prop_oneof![
        Just(PrivacyTier::Public),
        Just(PrivacyTier::Friends),
        Just(PrivacyTier::Private),
        "[a-z]{1,8}".prop_map(|raw| PrivacyTier::parse(&raw)),
    ]
}

fn arb_unknown_tier() -> impl Strategy<Value = PrivacyTier> {
    "[a-z]{1,8}"
        .prop_filter("recognized tier", |raw| !PrivacyTier::parse(raw).is_recognized())
        .prop_map(|raw| PrivacyTier::parse(&raw))
}

fn arb_view() -> impl Strategy<Value = ViewPermission> {
    prop_oneof![
        Just(ViewPermission::Anyone),
        Just(ViewPermission::Followers),
        Just(ViewPermission::Invitees),
        Just(ViewPermission::HostOnly),
        Just(ViewPermission::parse("everyone")),
    ]
}

fn arb_join() -> impl Strategy<Value = JoinPermission> {
    prop_oneof![
        Just(JoinPermission::Anyone),
        Just(JoinPermission::ApprovalRequired),
        Just(JoinPermission::Followers),
        Just(JoinPermission::Invited),
        Just(JoinPermission::parse("whoever")),
    ]
}

fn arb_overrides() -> impl Strategy<Value = PermissionOverrides> {
    (
        prop::option::of(arb_view()),
        prop::option::of(arb_join()),
        prop::option::of(any::<bool>()),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(can_view, can_join, appear_in_feed, appear_in_search)| {
            PermissionOverrides {
                can_view,
                can_join,
                appear_in_feed,
                appear_in_search,
                ..PermissionOverrides::default()
            }
        })
}

prop_compose! {
    fn arb_event()(
        seed in any::<u8>(),
        host in prop::option::weighted(0.95, arb_user()),
        tier in arb_tier(),
        co_hosts in arb_users(),
        attendees in arb_users(),
        invited in arb_users(),
        overrides in arb_overrides(),
        starts_at in prop::option::of(0u64..100),
        category in prop::option::of(prop_oneof![Just("music"), Just("food")]),
    ) -> Event {
        let mut event = Event::new(EventId::new_from_entropy([seed; 32]), user(0), tier)
            .with_attendees(attendees)
            .with_overrides(overrides);
        event.host = host;
        event.co_hosts = co_hosts.into_iter().collect();
        event.invited_users = invited.into_iter().collect();
        event.starts_at = starts_at.map(PhysicalTime::from_millis);
        event.category = category.map(str::to_string);
        event
    }
}

fn arb_options() -> impl Strategy<Value = DiscoveryOptions> {
    (
        prop_oneof![Just(Surface::Search), Just(Surface::Feed)],
        prop::option::of(0u64..100),
        prop::option::of(prop_oneof![Just("music"), Just("food")]),
        prop::option::of(arb_user()),
    )
        .prop_map(|(surface, starts_after, category, host)| DiscoveryOptions {
            surface,
            starts_after: starts_after.map(PhysicalTime::from_millis),
            category: category.map(str::to_string),
            host,
        })
}

fn arb_non_staff_facts() -> impl Strategy<Value = ActorFacts> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(is_attendee, is_invited, is_friend_of_host, is_guest_token_holder)| ActorFacts {
            is_host: false,
            is_co_host: false,
            is_attendee,
            is_invited,
            is_friend_of_host,
            is_guest_token_holder,
        },
    )
}

proptest! {
    #[test]
    fn unknown_tier_denies_every_non_staff_action(
        tier in arb_unknown_tier(),
        facts in arb_non_staff_facts(),
    ) {
        let evaluator = PermissionEvaluator::with_defaults();
        let event = Event::new(EventId::new_from_entropy([1u8; 32]), user(0), tier);
        for action in Action::ALL {
            prop_assert!(!evaluator.evaluate(&event, &facts, action));
        }
    }

    #[test]
    fn unknown_catalog_values_deny_their_action(
        facts in arb_non_staff_facts(),
        raw in "[a-z]{1,8}",
    ) {
        let mut catalog = PolicyCatalog::presets();
        catalog.public.can_join = JoinPermission::Unrecognized(format!("x-{raw}"));
        catalog.public.can_share = SharePermission::Unrecognized(format!("x-{raw}"));
        catalog.public.can_invite = InvitePermission::Unrecognized(format!("x-{raw}"));
        let evaluator = PermissionEvaluator::new(catalog);
        let event = Event::new(EventId::new_from_entropy([1u8; 32]), user(0), PrivacyTier::Public);
        prop_assert!(!evaluator.can_join(&event, &facts));
        prop_assert!(!evaluator.can_share(&event, &facts));
        prop_assert!(!evaluator.can_invite(&event, &facts));
    }

    #[test]
    fn host_and_co_host_are_always_allowed(
        event in arb_event(),
        co_host in any::<bool>(),
        rest in arb_non_staff_facts(),
    ) {
        let evaluator = PermissionEvaluator::with_defaults();
        let facts = ActorFacts {
            is_host: !co_host,
            is_co_host: co_host,
            ..rest
        };
        for action in Action::ALL {
            prop_assert!(evaluator.evaluate(&event, &facts, action));
        }
    }

    #[test]
    fn pushed_predicate_matches_exactly_the_discoverable_events(
        events in prop::collection::vec(arb_event(), 0..12),
        viewer in arb_user(),
        friend_ids in arb_users(),
        options in arb_options(),
    ) {
        let friends: FriendSet = friend_ids.into_iter().filter(|f| *f != viewer).collect();
        let builder = DiscoveryPredicateBuilder::new(Arc::new(PolicyCatalog::presets()));
        let filter = VisibilityFilter::default();
        let predicate = builder.build(&viewer, &friends, &options);

        for event in &events {
            let in_memory = !filter
                .filter_discoverable(vec![event.clone()], &viewer, &friends, &options)
                .is_empty();
            prop_assert_eq!(predicate.matches(event), in_memory, "predicate: {}", predicate);
        }

        let all = filter.filter_discoverable(events.clone(), &viewer, &friends, &options);
        let pushed: Vec<Event> = events.into_iter().filter(|e| predicate.matches(e)).collect();
        let revalidated = filter.filter_discoverable(pushed, &viewer, &friends, &options);
        prop_assert_eq!(all, revalidated);
    }
}
