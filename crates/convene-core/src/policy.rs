//! Privacy tiers and permission values
//!
//! Every value that arrives from storage or a policy file is parsed into a
//! closed enum with one extra `Unrecognized` variant. Unknown input is
//! therefore a distinct branch the evaluator has to handle, and it always
//! handles it by denying.
//!
//! Recognized variants are declared least restrictive first; that order is
//! what per-event overrides use when they narrow a tier default.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! policy_value {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        strictest $strictest:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Value this build does not recognize; always evaluates to deny.
            Unrecognized(String),
        }

        impl $name {
            /// Every recognized value, least restrictive first.
            pub fn known() -> Vec<Self> {
                vec![$(Self::$variant),+]
            }

            /// The most restrictive recognized value.
            pub fn strictest() -> Self {
                Self::$strictest
            }

            /// Parse a stored value; unknown strings become `Unrecognized`.
            pub fn parse(raw: &str) -> Self {
                match raw {
                    $($text => Self::$variant,)+
                    other => Self::Unrecognized(other.to_string()),
                }
            }

            /// Stored string form.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Unrecognized(raw) => raw,
                }
            }

            /// Whether this value is one of the recognized variants.
            pub fn is_recognized(&self) -> bool {
                !matches!(self, Self::Unrecognized(_))
            }

            /// Position in the restrictiveness order; `None` when unrecognized.
            pub fn restrictiveness(&self) -> Option<usize> {
                Self::known().iter().position(|known| known == self)
            }

            /// Apply an override, keeping whichever value is more restrictive.
            ///
            /// An override can only narrow. An unrecognized default or
            /// override wins outright so the field stays fail-closed.
            pub fn narrowed_by(&self, narrower: Option<&Self>) -> Self {
                let Some(narrower) = narrower else {
                    return self.clone();
                };
                match (self.restrictiveness(), narrower.restrictiveness()) {
                    (None, _) => self.clone(),
                    (_, None) => narrower.clone(),
                    (Some(base), Some(other)) if other > base => narrower.clone(),
                    _ => self.clone(),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::parse(&raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::parse(raw)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

policy_value!(
    /// Privacy tier chosen by the host.
    PrivacyTier {
        /// Anyone may find and view the event
        Public => "public",
        /// Only the host's accepted friends
        Friends => "friends",
        /// Only explicitly invited users
        Private => "private",
    }
    strictest Private
);

policy_value!(
    /// Who may view an event.
    ViewPermission {
        /// Anyone, given a link or a discovery surface
        Anyone => "anyone",
        /// Accepted friends of the host
        Followers => "followers",
        /// Users on the invitation list
        Invitees => "invitees",
        /// Host and co-hosts only
        HostOnly => "host-only",
    }
    strictest HostOnly
);

policy_value!(
    /// Who may join an event.
    ///
    /// `ApprovalRequired` sits below `Followers`: anyone may ask, so it is
    /// narrower than `Anyone` but wider than friends-only.
    JoinPermission {
        /// Anyone may join immediately
        Anyone => "anyone",
        /// Anyone may request; the host approves
        ApprovalRequired => "approval-required",
        /// Accepted friends of the host
        Followers => "followers",
        /// Users on the invitation list
        Invited => "invited",
    }
    strictest Invited
);

policy_value!(
    /// Who may share an event.
    ///
    /// Attendees may share under every recognized value; the value only
    /// decides whether viewers who are not attending may share too.
    SharePermission {
        /// Anyone
        Anyone => "anyone",
        /// Attendees
        Attendees => "attendees",
        /// Co-hosts and the host
        CoHosts => "co-hosts",
        /// The host
        HostOnly => "host-only",
    }
    strictest HostOnly
);

policy_value!(
    /// Who may invite others to an event.
    InvitePermission {
        /// Anyone who can view
        Anyone => "anyone",
        /// Attendees
        Attendees => "attendees",
        /// Host and co-hosts
        HostCohost => "host-cohost",
        /// The host
        HostOnly => "host-only",
    }
    strictest HostOnly
);

/// Discovery surface an event may appear on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Search results
    Search,
    /// Public and friends feeds
    Feed,
}

/// Permissions and visibility flags attached to one privacy tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionBundle {
    /// Who may view
    pub can_view: ViewPermission,
    /// Who may join
    pub can_join: JoinPermission,
    /// Who may share
    pub can_share: SharePermission,
    /// Who may invite
    pub can_invite: InvitePermission,
    /// Whether the event may surface in feeds
    pub appear_in_feed: bool,
    /// Whether the event may surface in search
    pub appear_in_search: bool,
    /// Whether viewers who are not attending may see the attendee list
    pub show_attendees_to_public: bool,
}

impl PermissionBundle {
    /// Bundle used for unknown tiers: host and co-hosts only, invisible everywhere.
    pub fn most_restrictive() -> Self {
        Self {
            can_view: ViewPermission::strictest(),
            can_join: JoinPermission::strictest(),
            can_share: SharePermission::strictest(),
            can_invite: InvitePermission::strictest(),
            appear_in_feed: false,
            appear_in_search: false,
            show_attendees_to_public: false,
        }
    }

    /// Whether the bundle lets events surface on `surface`.
    pub fn appears_on(&self, surface: Surface) -> bool {
        match surface {
            Surface::Search => self.appear_in_search,
            Surface::Feed => self.appear_in_feed,
        }
    }

    /// Apply per-event overrides. Every field can only become more restrictive.
    pub fn narrowed_by(&self, overrides: &PermissionOverrides) -> Self {
        Self {
            can_view: self.can_view.narrowed_by(overrides.can_view.as_ref()),
            can_join: self.can_join.narrowed_by(overrides.can_join.as_ref()),
            can_share: self.can_share.narrowed_by(overrides.can_share.as_ref()),
            can_invite: self.can_invite.narrowed_by(overrides.can_invite.as_ref()),
            appear_in_feed: self.appear_in_feed && overrides.appear_in_feed.unwrap_or(true),
            appear_in_search: self.appear_in_search && overrides.appear_in_search.unwrap_or(true),
            show_attendees_to_public: self.show_attendees_to_public
                && overrides.show_attendees_to_public.unwrap_or(true),
        }
    }

    /// Names and raw values of every unrecognized permission in this bundle.
    pub fn unrecognized_values(&self) -> Vec<(&'static str, String)> {
        let mut found = Vec::new();
        if !self.can_view.is_recognized() {
            found.push(("can_view", self.can_view.to_string()));
        }
        if !self.can_join.is_recognized() {
            found.push(("can_join", self.can_join.to_string()));
        }
        if !self.can_share.is_recognized() {
            found.push(("can_share", self.can_share.to_string()));
        }
        if !self.can_invite.is_recognized() {
            found.push(("can_invite", self.can_invite.to_string()));
        }
        found
    }
}

/// Per-event adjustments to the tier default. `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverrides {
    /// Narrower view permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_view: Option<ViewPermission>,
    /// Narrower join permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_join: Option<JoinPermission>,
    /// Narrower share permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_share: Option<SharePermission>,
    /// Narrower invite permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_invite: Option<InvitePermission>,
    /// Feed opt-out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appear_in_feed: Option<bool>,
    /// Search opt-out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appear_in_search: Option<bool>,
    /// Attendee-list opt-out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_attendees_to_public: Option<bool>,
}

impl PermissionOverrides {
    /// Override flag for a discovery surface.
    pub fn surface_flag(&self, surface: Surface) -> Option<bool> {
        match surface {
            Surface::Search => self.appear_in_search,
            Surface::Feed => self.appear_in_feed,
        }
    }

    /// Names and raw values of every unrecognized override.
    pub fn unrecognized_values(&self) -> Vec<(&'static str, String)> {
        let mut found = Vec::new();
        if let Some(value) = self.can_view.as_ref().filter(|v| !v.is_recognized()) {
            found.push(("can_view", value.to_string()));
        }
        if let Some(value) = self.can_join.as_ref().filter(|v| !v.is_recognized()) {
            found.push(("can_join", value.to_string()));
        }
        if let Some(value) = self.can_share.as_ref().filter(|v| !v.is_recognized()) {
            found.push(("can_share", value.to_string()));
        }
        if let Some(value) = self.can_invite.as_ref().filter(|v| !v.is_recognized()) {
            found.push(("can_invite", value.to_string()));
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tier_parses_to_unrecognized() {
        assert_eq!(PrivacyTier::parse("friends"), PrivacyTier::Friends);
        assert_eq!(
            PrivacyTier::parse("secret"),
            PrivacyTier::Unrecognized("secret".to_string())
        );
        assert!(!PrivacyTier::parse("").is_recognized());
    }

    #[test]
    fn test_serde_uses_stored_strings() {
        let json = serde_json::to_string(&ViewPermission::HostOnly).unwrap();
        assert_eq!(json, "\"host-only\"");
        let parsed: InvitePermission = serde_json::from_str("\"everyone\"").unwrap();
        assert_eq!(parsed, InvitePermission::Unrecognized("everyone".to_string()));
    }

    #[test]
    fn test_override_only_narrows() {
        let base = ViewPermission::Followers;
        assert_eq!(
            base.narrowed_by(Some(&ViewPermission::Anyone)),
            ViewPermission::Followers
        );
        assert_eq!(
            base.narrowed_by(Some(&ViewPermission::HostOnly)),
            ViewPermission::HostOnly
        );
        assert_eq!(base.narrowed_by(None), ViewPermission::Followers);
    }

    #[test]
    fn test_unrecognized_override_stays_unrecognized() {
        let bogus = ViewPermission::parse("everyone");
        assert_eq!(
            ViewPermission::Anyone.narrowed_by(Some(&bogus)),
            bogus
        );
    }

    #[test]
    fn test_flag_overrides_cannot_widen() {
        let mut bundle = PermissionBundle::most_restrictive();
        bundle.appear_in_feed = false;
        let overrides = PermissionOverrides {
            appear_in_feed: Some(true),
            ..PermissionOverrides::default()
        };
        assert!(!bundle.narrowed_by(&overrides).appear_in_feed);
    }

    #[test]
    fn test_most_restrictive_bundle() {
        let bundle = PermissionBundle::most_restrictive();
        assert_eq!(bundle.can_view, ViewPermission::HostOnly);
        assert_eq!(bundle.can_join, JoinPermission::Invited);
        assert!(!bundle.appears_on(Surface::Search));
        assert!(!bundle.appears_on(Surface::Feed));
    }
}
