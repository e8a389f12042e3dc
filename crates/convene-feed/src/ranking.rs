//! Feed Ranking
//!
//! Scores visibility-filtered events for one viewer as a weighted sum of
//! independent signals, then sorts them into a total order:
//!
//! 1. score, descending
//! 2. start time, ascending
//! 3. event id, ascending
//!
//! Scoring is a pure function of the candidates, the context and the
//! weights. "Now" lives in the context and is read once by the caller, so
//! repeated calls over the same inputs always produce the same order.

use convene_access::FriendSet;
use convene_core::config::parse_setting;
use convene_core::time::MS_PER_DAY;
use convene_core::{
    ConveneError, ConveneResult, Event, EventId, PhysicalTime, PrivacyTier, UserId,
};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Weight of each ranking signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    /// Viewer already attends
    pub attending: i64,
    /// Host is one of the viewer's friends
    pub friend_host: i64,
    /// Viewer follows the host without being friends
    pub followed_host: i64,
    /// Private event the viewer was invited to
    pub invited_private: i64,
    /// Any friends-tier event
    pub friends_tier: i64,
    /// Points per attendee
    pub per_attendee: i64,
    /// Maximum points from attendee count
    pub attendee_cap: i64,
    /// Starts within `soon_window_days`
    pub starts_soon: i64,
    /// Starts within `imminent_window_days`, on top of `starts_soon`
    pub starts_imminently: i64,
    /// Points per attending friend
    pub per_mutual_friend: i64,
    /// Added when the event starts after `distant_after_days`; usually negative
    pub distant: i64,
    /// Event category or a tag matches the viewer's interests
    pub category_affinity: i64,
    /// Width of the "soon" window
    pub soon_window_days: u64,
    /// Width of the "imminent" window
    pub imminent_window_days: u64,
    /// Events further out than this are distant
    pub distant_after_days: u64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            attending: 100,
            friend_host: 60,
            followed_host: 10,
            invited_private: 30,
            friends_tier: 20,
            per_attendee: 2,
            attendee_cap: 50,
            starts_soon: 15,
            starts_imminently: 25,
            per_mutual_friend: 5,
            distant: -10,
            category_affinity: 10,
            soon_window_days: 7,
            imminent_window_days: 1,
            distant_after_days: 30,
        }
    }
}

impl RankingWeights {
    /// Reject weight sets whose windows or caps contradict each other.
    pub fn validate(&self) -> ConveneResult<()> {
        if self.attendee_cap < 0 {
            return Err(ConveneError::invalid("attendee_cap must not be negative"));
        }
        if self.per_attendee < 0 {
            return Err(ConveneError::invalid("per_attendee must not be negative"));
        }
        if self.imminent_window_days > self.soon_window_days {
            return Err(ConveneError::invalid(format!(
                "imminent window ({} days) is longer than the soon window ({} days)",
                self.imminent_window_days, self.soon_window_days
            )));
        }
        if self.distant_after_days < self.soon_window_days {
            return Err(ConveneError::invalid(format!(
                "distant threshold ({} days) is shorter than the soon window ({} days)",
                self.distant_after_days, self.soon_window_days
            )));
        }
        Ok(())
    }

    /// Set one weight by name.
    pub fn set(&mut self, key: &str, value: &str) -> ConveneResult<()> {
        match key {
            "attending" => self.attending = parse_setting(key, value)?,
            "friend_host" => self.friend_host = parse_setting(key, value)?,
            "followed_host" => self.followed_host = parse_setting(key, value)?,
            "invited_private" => self.invited_private = parse_setting(key, value)?,
            "friends_tier" => self.friends_tier = parse_setting(key, value)?,
            "per_attendee" => self.per_attendee = parse_setting(key, value)?,
            "attendee_cap" => self.attendee_cap = parse_setting(key, value)?,
            "starts_soon" => self.starts_soon = parse_setting(key, value)?,
            "starts_imminently" => self.starts_imminently = parse_setting(key, value)?,
            "per_mutual_friend" => self.per_mutual_friend = parse_setting(key, value)?,
            "distant" => self.distant = parse_setting(key, value)?,
            "category_affinity" => self.category_affinity = parse_setting(key, value)?,
            "soon_window_days" => self.soon_window_days = parse_setting(key, value)?,
            "imminent_window_days" => self.imminent_window_days = parse_setting(key, value)?,
            "distant_after_days" => self.distant_after_days = parse_setting(key, value)?,
            other => {
                return Err(ConveneError::invalid(format!(
                    "Unknown ranking setting: {other}"
                )))
            }
        }
        Ok(())
    }
}

/// One ranking signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Viewer attends
    Attending,
    /// Host is a friend
    FriendHost,
    /// Host is followed but not a friend
    FollowedHost,
    /// Invited to a private event
    InvitedPrivate,
    /// Friends-tier event
    FriendsTier,
    /// Attendee count
    Attendees,
    /// Starts within the soon window
    StartsSoon,
    /// Starts within the imminent window
    StartsImminently,
    /// Friends among the attendees
    MutualFriends,
    /// Far in the future
    Distant,
    /// Matches the viewer's interests
    CategoryAffinity,
}

/// Points one signal added to a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalContribution {
    /// Which signal fired
    pub signal: Signal,
    /// Points it added (negative for penalties)
    pub points: i64,
}

/// An event with its score for one viewer. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCandidate {
    /// The event
    pub event: Event,
    /// Start time the candidate was ranked with
    pub starts_at: PhysicalTime,
    /// Sum of all contributions
    pub score: i64,
    /// Signals that fired, in evaluation order
    pub signals: Vec<SignalContribution>,
}

impl FeedCandidate {
    /// Key realizing the feed order; smaller sorts first.
    pub fn sort_key(&self) -> (Reverse<i64>, PhysicalTime, EventId) {
        (Reverse(self.score), self.starts_at, self.event.id)
    }

    /// Points contributed by `signal`, if it fired.
    pub fn points_for(&self, signal: Signal) -> Option<i64> {
        self.signals
            .iter()
            .find(|c| c.signal == signal)
            .map(|c| c.points)
    }
}

impl Ord for FeedCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for FeedCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-viewer inputs to ranking, captured once per request.
#[derive(Debug, Clone)]
pub struct FeedContext {
    /// Who the feed is for
    pub viewer: UserId,
    /// Viewer's resolved friend set
    pub friends: FriendSet,
    /// Users the viewer follows. Only ever a ranking hint; access always
    /// goes through the friend set.
    pub following: BTreeSet<UserId>,
    /// Events the viewer currently attends
    pub attending: BTreeSet<EventId>,
    /// Precomputed friend co-attendance per event; computed from the
    /// attendee list when absent
    pub mutual_counts: Option<BTreeMap<EventId, u32>>,
    /// Categories and tags the viewer is interested in
    pub affinity: BTreeSet<String>,
    /// The request's "now"
    pub now: PhysicalTime,
}

impl FeedContext {
    /// Context with no attendance, counts or interests.
    pub fn new(viewer: UserId, friends: FriendSet, now: PhysicalTime) -> Self {
        Self {
            viewer,
            friends,
            following: BTreeSet::new(),
            attending: BTreeSet::new(),
            mutual_counts: None,
            affinity: BTreeSet::new(),
            now,
        }
    }

    /// Mark events as attended by the viewer.
    pub fn with_attending(mut self, events: impl IntoIterator<Item = EventId>) -> Self {
        self.attending.extend(events);
        self
    }

    /// Add users the viewer follows.
    pub fn with_following(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.following.extend(users);
        self
    }

    /// Supply precomputed co-attendance counts.
    pub fn with_mutual_counts(mut self, counts: BTreeMap<EventId, u32>) -> Self {
        self.mutual_counts = Some(counts);
        self
    }

    /// Add interest categories or tags.
    pub fn with_affinity<S: Into<String>>(mut self, topics: impl IntoIterator<Item = S>) -> Self {
        self.affinity.extend(topics.into_iter().map(Into::into));
        self
    }

    fn is_attending(&self, event: &Event) -> bool {
        self.attending.contains(&event.id) || event.attendees.contains(&self.viewer)
    }

    fn mutual_friends(&self, event: &Event) -> u32 {
        if let Some(counts) = &self.mutual_counts {
            return counts.get(&event.id).copied().unwrap_or(0);
        }
        let count = event
            .attendees
            .iter()
            .filter(|attendee| self.friends.contains(attendee))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn has_affinity(&self, event: &Event) -> bool {
        event
            .category
            .iter()
            .chain(event.tags.iter())
            .any(|topic| self.affinity.contains(topic))
    }
}

/// Scores and orders feed candidates.
#[derive(Debug, Clone, Default)]
pub struct FeedRanker {
    weights: RankingWeights,
}

impl FeedRanker {
    /// Create a ranker with `weights`.
    pub fn new(weights: RankingWeights) -> Self {
        Self { weights }
    }

    /// The weights in use.
    pub fn weights(&self) -> &RankingWeights {
        &self.weights
    }

    /// Score one event, or `None` when it has no start time.
    pub fn score(&self, event: &Event, context: &FeedContext) -> Option<FeedCandidate> {
        let Some(starts_at) = event.starts_at else {
            warn!(event_id = %event.id, "Excluding feed candidate without a start time");
            return None;
        };

        let w = &self.weights;
        let mut signals = Vec::new();
        let mut add = |signal, points: i64| {
            if points != 0 {
                signals.push(SignalContribution { signal, points });
            }
        };

        if context.is_attending(event) {
            add(Signal::Attending, w.attending);
        }
        match event.host {
            Some(host) if context.friends.contains(&host) => {
                add(Signal::FriendHost, w.friend_host);
            }
            Some(host) if context.following.contains(&host) => {
                add(Signal::FollowedHost, w.followed_host);
            }
            _ => {}
        }
        if event.privacy_tier == PrivacyTier::Private
            && event.invited_users.contains(&context.viewer)
        {
            add(Signal::InvitedPrivate, w.invited_private);
        }
        if event.privacy_tier == PrivacyTier::Friends {
            add(Signal::FriendsTier, w.friends_tier);
        }

        let attendees = i64::try_from(event.attendee_count()).unwrap_or(i64::MAX);
        add(
            Signal::Attendees,
            attendees.saturating_mul(w.per_attendee).min(w.attendee_cap),
        );

        let until = context.now.millis_until(starts_at);
        if until >= 0 {
            if until <= window_ms(w.soon_window_days) {
                add(Signal::StartsSoon, w.starts_soon);
            }
            if until <= window_ms(w.imminent_window_days) {
                add(Signal::StartsImminently, w.starts_imminently);
            }
            if until > window_ms(w.distant_after_days) {
                add(Signal::Distant, w.distant);
            }
        }

        add(
            Signal::MutualFriends,
            i64::from(context.mutual_friends(event)).saturating_mul(w.per_mutual_friend),
        );
        if context.has_affinity(event) {
            add(Signal::CategoryAffinity, w.category_affinity);
        }

        let score = signals
            .iter()
            .fold(0i64, |total, c| total.saturating_add(c.points));
        Some(FeedCandidate {
            event: event.clone(),
            starts_at,
            score,
            signals,
        })
    }

    /// Score every event and sort into feed order.
    pub fn rank(&self, events: &[Event], context: &FeedContext) -> Vec<FeedCandidate> {
        let mut candidates: Vec<FeedCandidate> = events
            .iter()
            .filter_map(|event| self.score(event, context))
            .collect();
        candidates.sort();
        debug!(
            viewer = %context.viewer,
            events = events.len(),
            ranked = candidates.len(),
            "Ranked feed candidates"
        );
        candidates
    }
}

fn window_ms(days: u64) -> i128 {
    i128::from(days) * i128::from(MS_PER_DAY)
}
