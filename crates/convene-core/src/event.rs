//! Event record
//!
//! The subset of an event that access control and ranking read. Records come
//! straight from storage and are not trusted: the host may be missing, the
//! tier may be a value this build does not know, and the start time may be
//! absent. Consumers handle each of those explicitly.

use crate::identifiers::{EventId, UserId};
use crate::policy::{PermissionOverrides, PrivacyTier};
use crate::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Event as stored, restricted to the fields the access engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier
    pub id: EventId,
    /// Owning host; `None` only for malformed records
    pub host: Option<UserId>,
    /// Co-hosts share host rights except deletion and ownership transfer
    #[serde(default)]
    pub co_hosts: BTreeSet<UserId>,
    /// Users attending
    #[serde(default)]
    pub attendees: BTreeSet<UserId>,
    /// Users invited (consulted by invite-based permissions)
    #[serde(default)]
    pub invited_users: BTreeSet<UserId>,
    /// Current privacy tier
    pub privacy_tier: PrivacyTier,
    /// Narrowing overrides of the tier default
    #[serde(default)]
    pub overrides: PermissionOverrides,
    /// Start time
    pub starts_at: Option<PhysicalTime>,
    /// Primary category
    pub category: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Event {
    /// Create an event with a host, a tier and no participants.
    pub fn new(id: EventId, host: UserId, privacy_tier: PrivacyTier) -> Self {
        Self {
            id,
            host: Some(host),
            co_hosts: BTreeSet::new(),
            attendees: BTreeSet::new(),
            invited_users: BTreeSet::new(),
            privacy_tier,
            overrides: PermissionOverrides::default(),
            starts_at: None,
            category: None,
            tags: Vec::new(),
        }
    }

    /// Set the start time.
    pub fn starting_at(mut self, starts_at: PhysicalTime) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Add a co-host.
    pub fn with_co_host(mut self, user: UserId) -> Self {
        self.co_hosts.insert(user);
        self
    }

    /// Add an attendee.
    pub fn with_attendee(mut self, user: UserId) -> Self {
        self.attendees.insert(user);
        self
    }

    /// Add several attendees.
    pub fn with_attendees(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.attendees.extend(users);
        self
    }

    /// Add an invited user.
    pub fn with_invited(mut self, user: UserId) -> Self {
        self.invited_users.insert(user);
        self
    }

    /// Replace the overrides.
    pub fn with_overrides(mut self, overrides: PermissionOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set the category.
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add a tag.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Whether `user` is the host or a co-host.
    pub fn is_staff(&self, user: &UserId) -> bool {
        self.host.as_ref() == Some(user) || self.co_hosts.contains(user)
    }

    /// Number of attendees.
    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_includes_host_and_co_hosts() {
        let host = UserId::new_from_entropy([1u8; 32]);
        let co_host = UserId::new_from_entropy([2u8; 32]);
        let guest = UserId::new_from_entropy([3u8; 32]);
        let event = Event::new(EventId::new_from_entropy([9u8; 32]), host, PrivacyTier::Public)
            .with_co_host(co_host)
            .with_attendee(guest);

        assert!(event.is_staff(&host));
        assert!(event.is_staff(&co_host));
        assert!(!event.is_staff(&guest));
    }

    #[test]
    fn test_deserialize_tolerates_unknown_tier_and_missing_host() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "host": null,
            "privacy_tier": "secret",
            "starts_at": null,
            "category": null
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(event.host.is_none());
        assert!(!event.privacy_tier.is_recognized());
        assert!(event.attendees.is_empty());
    }
}
