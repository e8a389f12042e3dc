//! Friend set resolution
//!
//! A viewer's friend set is fetched fresh for every request and never
//! cached. Each accepted edge is confirmed in the reverse direction before it
//! counts, since the graph may hold a half-accepted pair.

use convene_core::effects::{FriendGraphEffects, GraphError};
use convene_core::{ConveneResult, UserId};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// The accepted, mutually confirmed friends of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FriendSet {
    friends: BTreeSet<UserId>,
}

impl FriendSet {
    /// A set with no friends.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetch and confirm the friends of `user`.
    ///
    /// Any graph failure is returned as `UpstreamFetch`.
    pub async fn fetch<G>(graph: &G, user: &UserId) -> ConveneResult<Self>
    where
        G: FriendGraphEffects + ?Sized,
    {
        let claimed = graph.accepted_friends(user).await?;
        let checks = claimed
            .into_iter()
            .filter(|friend| friend != user)
            .map(move |friend| async move {
                let reverse = graph.friend_edge(&friend, user).await?;
                Ok::<_, GraphError>((friend, reverse))
            });

        let mut friends = BTreeSet::new();
        for (friend, reverse) in try_join_all(checks).await? {
            match reverse {
                Some(edge) if edge.is_accepted() => {
                    friends.insert(friend);
                }
                Some(edge) => warn!(
                    user = %user,
                    friend = %friend,
                    reverse_status = ?edge.status,
                    "Asymmetric friendship: reverse edge not accepted, ignoring"
                ),
                None => warn!(
                    user = %user,
                    friend = %friend,
                    "Asymmetric friendship: reverse edge missing, ignoring"
                ),
            }
        }

        debug!(user = %user, friends = friends.len(), "Friend set resolved");
        Ok(Self { friends })
    }

    /// Fetch the friends of `user`, treating any failure as having no friends.
    pub async fn resolve<G>(graph: &G, user: &UserId) -> Self
    where
        G: FriendGraphEffects + ?Sized,
    {
        match Self::fetch(graph, user).await {
            Ok(set) => set,
            Err(err) => {
                warn!(
                    user = %user,
                    error = %err,
                    "Friend set unavailable, continuing with no friends"
                );
                Self::empty()
            }
        }
    }

    /// Whether `user` is in the set.
    pub fn contains(&self, user: &UserId) -> bool {
        self.friends.contains(user)
    }

    /// Number of friends.
    pub fn len(&self) -> usize {
        self.friends.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }

    /// Friends in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.friends.iter()
    }
}

impl FromIterator<UserId> for FriendSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self {
            friends: iter.into_iter().collect(),
        }
    }
}
