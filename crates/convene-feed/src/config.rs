//! Engine configuration
//!
//! One TOML document carries the policy catalog and the ranking weights:
//!
//! ```toml
//! [policy.friends]
//! can_view = "followers"
//! can_join = "followers"
//! can_share = "attendees"
//! can_invite = "host-cohost"
//! appear_in_feed = true
//! appear_in_search = true
//! show_attendees_to_public = false
//!
//! [ranking]
//! attending = 100
//! attendee_cap = 50
//! ```
//!
//! Omitted sections fall back to the built-in presets, but a `[policy]`
//! section must define all three tiers. Ranking weights can be overridden
//! with `CONVENE_RANKING_<NAME>` environment variables.

use crate::ranking::RankingWeights;
use convene_access::PolicyCatalog;
use convene_core::{ConfigSource, ConveneResult};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConveneConfig {
    /// Tier → permission bundle table
    pub policy: PolicyCatalog,
    /// Feed ranking weights
    pub ranking: RankingWeights,
}

impl ConfigSource for ConveneConfig {
    const ENV_PREFIX: &'static str = "CONVENE_RANKING_";

    fn set_from_string(&mut self, key: &str, value: &str) -> ConveneResult<()> {
        self.ranking.set(key, value)
    }

    /// Unrecognized permission values in the catalog are reported but not
    /// rejected; they deny at evaluation time. Use
    /// [`PolicyCatalog::validate`] to reject them outright.
    fn validate(&self) -> ConveneResult<()> {
        for defect in self.policy.defects() {
            warn!(defect = %defect, "Policy configuration defect in catalog");
        }
        self.ranking.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convene_core::policy::{SharePermission, ViewPermission};

    #[test]
    fn test_empty_document_yields_presets() {
        let config = ConveneConfig::from_toml_str("").unwrap();
        assert_eq!(config, ConveneConfig::default());
        assert_eq!(config.policy, PolicyCatalog::presets());
    }

    #[test]
    fn test_ranking_section_overrides_defaults() {
        let config = ConveneConfig::from_toml_str("[ranking]\nattending = 120\n").unwrap();
        assert_eq!(config.ranking.attending, 120);
        assert_eq!(config.ranking.friend_host, 60);
    }

    #[test]
    fn test_policy_section_must_define_every_tier() {
        let toml = r#"
[policy.public]
can_view = "anyone"
can_join = "anyone"
can_share = "anyone"
can_invite = "anyone"
appear_in_feed = true
appear_in_search = true
show_attendees_to_public = true
"#;
        assert!(ConveneConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_unknown_permission_strings_are_accepted_and_reported() {
        let mut toml = toml::to_string(&ConveneConfig::default()).unwrap();
        toml = toml.replace("can_share = \"host-only\"", "can_share = \"everyone\"");
        let config = ConveneConfig::from_toml_str(&toml).unwrap();
        assert_eq!(
            config.policy.private.can_share,
            SharePermission::Unrecognized("everyone".to_string())
        );
        assert!(config.policy.validate().is_err());
        assert_eq!(config.policy.friends.can_view, ViewPermission::Followers);
    }

    #[test]
    fn test_invalid_windows_rejected() {
        let toml = "[ranking]\nimminent_window_days = 10\n";
        assert!(ConveneConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_set_from_string_targets_ranking() {
        let mut config = ConveneConfig::default();
        config.set_from_string("per_mutual_friend", "8").unwrap();
        assert_eq!(config.ranking.per_mutual_friend, 8);
        assert!(config.set_from_string("nonsense", "1").is_err());
    }
}
