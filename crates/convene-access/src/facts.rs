//! Actor facts
//!
//! The relationship between one actor and one event, derived on demand from
//! the current event record and the actor's current friend set. Facts are
//! never stored and never reused across requests.

use crate::friends::FriendSet;
use convene_core::effects::GuestGrant;
use convene_core::{ConveneError, ConveneResult, Event, UserId};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// Signed-in platform user
    User(UserId),
    /// Holder of a validated guest token
    Guest(GuestGrant),
    /// No identity at all
    Anonymous,
}

impl Actor {
    /// The platform account behind this actor, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::User(user) => Some(user),
            Self::Guest(_) | Self::Anonymous => None,
        }
    }
}

/// Derived relationship facts for one (event, actor) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorFacts {
    /// Actor owns the event
    pub is_host: bool,
    /// Actor is a co-host
    pub is_co_host: bool,
    /// Actor is attending
    pub is_attendee: bool,
    /// Actor is on the invitation list
    pub is_invited: bool,
    /// Actor and host are mutually accepted friends
    pub is_friend_of_host: bool,
    /// Actor holds a guest token for this event
    pub is_guest_token_holder: bool,
}

impl ActorFacts {
    /// Derive facts for `actor` against the current `event` record.
    ///
    /// Fails with `InvalidActorState` when the record has no host, which is a
    /// data-integrity problem rather than a refusal.
    pub fn derive(event: &Event, actor: &Actor, friends: &FriendSet) -> ConveneResult<Self> {
        let Some(host) = event.host else {
            error!(event_id = %event.id, "Event record has no host");
            return Err(ConveneError::invalid_actor_state(event.id, "event has no host"));
        };

        let facts = match actor {
            Actor::User(user) => {
                let is_host = *user == host;
                Self {
                    is_host,
                    is_co_host: !is_host && event.co_hosts.contains(user),
                    is_attendee: event.attendees.contains(user),
                    is_invited: event.invited_users.contains(user),
                    is_friend_of_host: !is_host && friends.contains(&host),
                    is_guest_token_holder: false,
                }
            }
            Actor::Guest(grant) => Self {
                is_guest_token_holder: grant.covers(&event.id),
                ..Self::default()
            },
            Actor::Anonymous => Self::default(),
        };
        Ok(facts)
    }

    /// Host or co-host.
    pub fn is_staff(&self) -> bool {
        self.is_host || self.is_co_host
    }
}
