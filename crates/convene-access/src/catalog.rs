//! Privacy Policy Catalog
//!
//! The single table mapping each privacy tier to its permission bundle. The
//! evaluator, the visibility filter and the predicate builder all read the
//! same catalog instance, so there is exactly one place a tier's rules live.
//!
//! The catalog is a struct with one field per tier rather than a map: a
//! catalog missing a tier cannot be constructed or deserialized. Tiers this
//! build does not recognize resolve to [`PermissionBundle::most_restrictive`].

use convene_core::policy::{
    InvitePermission, JoinPermission, PermissionBundle, PrivacyTier, SharePermission,
    ViewPermission,
};
use convene_core::{ConveneError, ConveneResult};
use serde::{Deserialize, Serialize};

/// Tier → bundle table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCatalog {
    /// Bundle for `public` events
    pub public: PermissionBundle,
    /// Bundle for `friends` events
    pub friends: PermissionBundle,
    /// Bundle for `private` events
    pub private: PermissionBundle,
}

impl PolicyCatalog {
    /// Built-in presets.
    pub fn presets() -> Self {
        Self {
            public: PermissionBundle {
                can_view: ViewPermission::Anyone,
                can_join: JoinPermission::Anyone,
                can_share: SharePermission::Anyone,
                can_invite: InvitePermission::Anyone,
                appear_in_feed: true,
                appear_in_search: true,
                show_attendees_to_public: true,
            },
            friends: PermissionBundle {
                can_view: ViewPermission::Followers,
                can_join: JoinPermission::Followers,
                can_share: SharePermission::Attendees,
                can_invite: InvitePermission::HostCohost,
                appear_in_feed: true,
                appear_in_search: true,
                show_attendees_to_public: false,
            },
            private: PermissionBundle {
                can_view: ViewPermission::Invitees,
                can_join: JoinPermission::Invited,
                can_share: SharePermission::HostOnly,
                can_invite: InvitePermission::HostOnly,
                appear_in_feed: false,
                appear_in_search: false,
                show_attendees_to_public: false,
            },
        }
    }

    /// Bundle for a recognized tier; `None` for anything else.
    pub fn bundle_for(&self, tier: &PrivacyTier) -> Option<&PermissionBundle> {
        match tier {
            PrivacyTier::Public => Some(&self.public),
            PrivacyTier::Friends => Some(&self.friends),
            PrivacyTier::Private => Some(&self.private),
            PrivacyTier::Unrecognized(_) => None,
        }
    }

    /// Bundle for any tier, falling back to the most restrictive bundle.
    pub fn resolve(&self, tier: &PrivacyTier) -> PermissionBundle {
        self.bundle_for(tier)
            .cloned()
            .unwrap_or_else(PermissionBundle::most_restrictive)
    }

    /// Every recognized tier with its bundle.
    pub fn tiers(&self) -> [(PrivacyTier, &PermissionBundle); 3] {
        [
            (PrivacyTier::Public, &self.public),
            (PrivacyTier::Friends, &self.friends),
            (PrivacyTier::Private, &self.private),
        ]
    }

    /// Every unrecognized permission value in the catalog, as `tier.field = value`.
    pub fn defects(&self) -> Vec<String> {
        self.tiers()
            .iter()
            .flat_map(|(tier, bundle)| {
                bundle
                    .unrecognized_values()
                    .into_iter()
                    .map(move |(field, value)| format!("{tier}.{field} = {value:?}"))
            })
            .collect()
    }

    /// Reject catalogs holding permission values this build does not recognize.
    ///
    /// Such a catalog still evaluates safely (the affected actions deny), but
    /// loading one is almost always a deployment mistake.
    pub fn validate(&self) -> ConveneResult<()> {
        let defects = self.defects();
        if defects.is_empty() {
            Ok(())
        } else {
            Err(ConveneError::policy_configuration(format!(
                "unrecognized permission values: {}",
                defects.join(", ")
            )))
        }
    }
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self::presets()
    }
}
