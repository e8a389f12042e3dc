//! Ranking scenarios and determinism properties.

#![allow(clippy::unwrap_used, clippy::expect_used, missing_docs)]

use convene_access::FriendSet;
use convene_core::time::MS_PER_HOUR;
use convene_core::{Event, EventId, PhysicalTime, PrivacyTier, UserId};
use convene_feed::{FeedContext, FeedRanker, Signal};
use proptest::prelude::*;

fn user(seed: u8) -> UserId {
    UserId::new_from_entropy([seed; 32])
}

fn event_id(seed: u8) -> EventId {
    EventId::new_from_entropy([seed; 32])
}

fn now() -> PhysicalTime {
    PhysicalTime::from_millis(1_700_000_000_000)
}

#[test]
fn scenario_d_commitments_then_friends_then_distant_crowds() {
    let viewer = user(9);
    let friend = user(1);

    let attended = Event::new(event_id(1), user(2), PrivacyTier::Public)
        .with_attendee(viewer)
        .starting_at(now().plus_days(3));
    let friend_urgent = Event::new(event_id(2), friend, PrivacyTier::Public)
        .starting_at(now().plus_millis(12 * MS_PER_HOUR));
    let public_distant = Event::new(event_id(3), user(3), PrivacyTier::Public)
        .with_attendees((100u8..140).map(user))
        .starting_at(now().plus_days(60));

    let friends: FriendSet = [friend].into_iter().collect();
    let context = FeedContext::new(viewer, friends, now()).with_attending([attended.id]);
    let ranked = FeedRanker::default().rank(
        &[public_distant.clone(), friend_urgent.clone(), attended.clone()],
        &context,
    );

    let order: Vec<EventId> = ranked.iter().map(|c| c.event.id).collect();
    assert_eq!(order, vec![attended.id, friend_urgent.id, public_distant.id]);

    assert_eq!(ranked[0].points_for(Signal::Attending), Some(100));
    assert_eq!(ranked[1].points_for(Signal::FriendHost), Some(60));
    assert_eq!(ranked[1].points_for(Signal::StartsImminently), Some(25));
    assert_eq!(ranked[2].points_for(Signal::Attendees), Some(50));
    assert_eq!(ranked[2].points_for(Signal::Distant), Some(-10));
}

prop_compose! {
    fn arb_event()(
        seed in any::<u8>(),
        host in 0u8..5,
        tier in prop_oneof![
            Just(PrivacyTier::Public),
            Just(PrivacyTier::Friends),
            Just(PrivacyTier::Private),
        ],
        attendees in prop::collection::vec(0u8..40, 0..30),
        invited in prop::collection::vec(0u8..10, 0..3),
        offset_hours in prop::option::weighted(0.9, -48i64..(24 * 90)),
    ) -> Event {
        let mut event = Event::new(EventId::new_from_entropy([seed; 32]), user(host), tier)
            .with_attendees(attendees.into_iter().map(user));
        event.invited_users = invited.into_iter().map(user).collect();
        event.starts_at = offset_hours.map(|hours| {
            let ms = now().ts_ms as i64 + hours * MS_PER_HOUR as i64;
            PhysicalTime::from_millis(ms as u64)
        });
        event
    }
}

proptest! {
    #[test]
    fn ranking_is_deterministic_and_order_independent(
        events in prop::collection::vec(arb_event(), 0..20),
        friend_ids in prop::collection::vec(0u8..10, 0..5),
    ) {
        let friends: FriendSet = friend_ids.into_iter().map(user).collect();
        let context = FeedContext::new(user(9), friends, now());
        let ranker = FeedRanker::default();

        let first = ranker.rank(&events, &context);
        let second = ranker.rank(&events, &context);
        prop_assert_eq!(&first, &second);

        let mut reversed = events.clone();
        reversed.reverse();
        let third = ranker.rank(&reversed, &context);
        let ids = |ranked: &[convene_feed::FeedCandidate]| {
            ranked.iter().map(|c| (c.event.id, c.score)).collect::<Vec<_>>()
        };
        prop_assert_eq!(ids(&first), ids(&third));

        for pair in first.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        prop_assert!(first.iter().all(|c| c.event.starts_at.is_some()));
    }
}
