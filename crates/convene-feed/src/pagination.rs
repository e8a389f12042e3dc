//! Cursor pagination over ranked feeds
//!
//! Every page is cut from a fresh ranking, so scores can move between pages.
//! The cursor therefore records what the client has already seen rather than
//! a position: the ids served so far and the clock reading the first page was
//! ranked with. A later page is the best-ranked items not yet served, which
//! means no item is ever served twice and none is skipped because it moved.
//! Order across page boundaries is not monotone when scores change. The
//! token grows with the number of items served.

use crate::ranking::FeedCandidate;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use convene_core::{ConveneError, ConveneResult, EventId, PhysicalTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Progress through a ranked feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    /// Clock reading every page of this traversal is ranked with
    pub as_of: PhysicalTime,
    /// Events already served, in serving order
    pub served: Vec<EventId>,
}

impl FeedCursor {
    /// Cursor for the first page of a traversal ranked at `as_of`.
    pub fn start(as_of: PhysicalTime) -> Self {
        Self {
            as_of,
            served: Vec::new(),
        }
    }

    /// Whether `event_id` was served on an earlier page.
    pub fn has_served(&self, event_id: &EventId) -> bool {
        self.served.contains(event_id)
    }

    fn advanced(&self, items: &[FeedCandidate]) -> Self {
        let mut served = self.served.clone();
        served.extend(items.iter().map(|c| c.event.id));
        Self {
            as_of: self.as_of,
            served,
        }
    }

    /// Opaque string form handed to clients.
    pub fn encode(&self) -> ConveneResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| ConveneError::invalid(format!("Failed to encode cursor: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Parse a cursor produced by [`encode`](Self::encode).
    pub fn decode(token: &str) -> ConveneResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| ConveneError::invalid(format!("Malformed cursor: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ConveneError::invalid(format!("Malformed cursor: {e}")))
    }
}

/// One page of a ranked feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPage {
    /// Items in feed order
    pub items: Vec<FeedCandidate>,
    /// Cursor for the following page; `None` on the last page
    pub next: Option<FeedCursor>,
}

impl FeedPage {
    /// Encoded form of [`next`](Self::next).
    pub fn next_token(&self) -> ConveneResult<Option<String>> {
        self.next.as_ref().map(FeedCursor::encode).transpose()
    }
}

/// Cut the next page out of candidates already in feed order.
///
/// A `limit` of zero is treated as one so a page always makes progress.
pub fn paginate(candidates: Vec<FeedCandidate>, cursor: &FeedCursor, limit: usize) -> FeedPage {
    let served: BTreeSet<EventId> = cursor.served.iter().copied().collect();
    let mut remaining = candidates
        .into_iter()
        .filter(|c| !served.contains(&c.event.id));

    let items: Vec<FeedCandidate> = remaining.by_ref().take(limit.max(1)).collect();
    let next = remaining
        .next()
        .is_some()
        .then(|| cursor.advanced(&items));
    FeedPage { items, next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::{FeedContext, FeedRanker};
    use convene_access::FriendSet;
    use convene_core::{Event, PrivacyTier, UserId};

    fn user(seed: u8) -> UserId {
        UserId::new_from_entropy([seed; 32])
    }

    fn now() -> PhysicalTime {
        PhysicalTime::from_millis(0)
    }

    fn events(count: u8) -> Vec<Event> {
        (0..count)
            .map(|i| {
                Event::new(EventId::new_from_entropy([i; 32]), user(1), PrivacyTier::Public)
                    .with_attendees((0..i).map(|a| user(100 + a)))
                    .starting_at(now().plus_days(10))
            })
            .collect()
    }

    fn rank(events: &[Event], viewer: UserId) -> Vec<FeedCandidate> {
        FeedRanker::default().rank(events, &FeedContext::new(viewer, FriendSet::empty(), now()))
    }

    fn ids(items: &[FeedCandidate]) -> Vec<EventId> {
        items.iter().map(|c| c.event.id).collect()
    }

    #[test]
    fn test_pages_cover_feed_without_repeats() {
        let all = rank(&events(7), user(9));
        let first = paginate(all.clone(), &FeedCursor::start(now()), 3);
        assert_eq!(first.items.len(), 3);
        let cursor = first.next.clone().unwrap();
        assert_eq!(cursor.served, ids(&first.items));

        let second = paginate(all.clone(), &cursor, 3);
        let third = paginate(all.clone(), second.next.as_ref().unwrap(), 3);
        assert_eq!(third.items.len(), 1);
        assert!(third.next.is_none());

        let served: Vec<_> = [first.items, second.items, third.items].concat();
        assert_eq!(ids(&served), ids(&all));
    }

    #[test]
    fn test_exact_fit_has_no_next_page() {
        let page = paginate(rank(&events(3), user(9)), &FeedCursor::start(now()), 3);
        assert_eq!(page.items.len(), 3);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_zero_limit_still_makes_progress() {
        let page = paginate(rank(&events(3), user(9)), &FeedCursor::start(now()), 0);
        assert_eq!(page.items.len(), 1);
        assert!(page.next.is_some());
    }

    #[test]
    fn test_item_that_moved_ahead_is_still_served() {
        let all = rank(&events(5), user(9));
        let first = paginate(all.clone(), &FeedCursor::start(now()), 2);
        let cursor = first.next.unwrap();

        let mut shifted = all.clone();
        shifted[4].score = 1_000;
        shifted.sort();
        let second = paginate(shifted, &cursor, 10);
        assert_eq!(second.items[0].event.id, all[4].event.id);
        assert_eq!(first.items.len() + second.items.len(), all.len());
    }

    #[test]
    fn test_item_that_dropped_is_not_served_again() {
        let viewer = user(9);
        let soon = |seed: u8, days: u64| {
            Event::new(EventId::new_from_entropy([seed; 32]), user(1), PrivacyTier::Public)
                .starting_at(now().plus_days(days))
        };
        let attended = soon(1, 12).with_attendee(viewer);
        let mut current = vec![attended.clone(), soon(2, 10), soon(3, 11)];

        let first = paginate(rank(&current, viewer), &FeedCursor::start(now()), 2);
        assert_eq!(first.items[0].event.id, attended.id);
        let cursor = first.next.unwrap();

        // The viewer leaves, so the event now ranks below everything unseen.
        current[0].attendees.clear();
        let second = paginate(rank(&current, viewer), &cursor, 2);
        assert!(second.items.iter().all(|c| !cursor.has_served(&c.event.id)));
        assert_eq!(ids(&second.items), vec![EventId::new_from_entropy([3; 32])]);
        assert!(second.next.is_none());
    }

    #[test]
    fn test_cursor_token_round_trip_and_rejection() {
        let page = paginate(rank(&events(4), user(9)), &FeedCursor::start(now()), 1);
        let token = page.next_token().unwrap().unwrap();
        assert_eq!(FeedCursor::decode(&token).unwrap(), page.next.unwrap());
        assert!(FeedCursor::decode("not a cursor!").is_err());
        assert!(FeedCursor::decode(&URL_SAFE_NO_PAD.encode(b"{}")).is_err());
    }
}
