//! Permission Evaluator
//!
//! Pure decision logic: given an event, the policy catalog and an actor's
//! facts, decide one action. No I/O and no shared state, so evaluators can be
//! cloned freely and called from any number of concurrent requests.
//!
//! # Evaluation order
//!
//! ```text
//! host / co-host ──────────────────────────────► Allow
//! unknown tier or permission value ────────────► Deny(PolicyConfiguration)
//! guest token holder, action ≠ view ───────────► Deny(GuestScope)
//! view / join / invite / share decision table ─► Allow | Deny(NotPermitted)
//! ```
//!
//! Join, invite and share additionally require that the actor can view.

use crate::catalog::PolicyCatalog;
use crate::facts::{Actor, ActorFacts};
use crate::friends::FriendSet;
use convene_core::policy::{
    InvitePermission, JoinPermission, PermissionBundle, PrivacyTier, SharePermission,
    ViewPermission,
};
use convene_core::{ConveneResult, Event};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Action an actor wants to take on an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// See the event
    View,
    /// Attend the event
    Join,
    /// Invite someone else
    Invite,
    /// Share the event
    Share,
}

impl Action {
    /// All actions.
    pub const ALL: [Action; 4] = [Action::View, Action::Join, Action::Invite, Action::Share];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::View => "view",
            Self::Join => "join",
            Self::Invite => "invite",
            Self::Share => "share",
        };
        f.write_str(s)
    }
}

impl FromStr for Action {
    type Err = convene_core::ConveneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Self::View),
            "join" => Ok(Self::Join),
            "invite" => Ok(Self::Invite),
            "share" => Ok(Self::Share),
            other => Err(convene_core::ConveneError::invalid(format!(
                "unknown action '{other}'"
            ))),
        }
    }
}

/// Why an action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenyReason {
    /// Tier or permission value not recognized
    PolicyConfiguration,
    /// The actor's relationship to the event does not permit the action
    NotPermitted,
    /// Guest tokens only grant viewing
    GuestScope,
}

/// Outcome of evaluating one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Action is allowed
    Allow,
    /// Action is denied
    Deny(DenyReason),
}

impl Decision {
    /// Whether the action is allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny(DenyReason::NotPermitted)
        }
    }
}

/// Result of a join attempt as seen by the access engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// Actor already attends
    AlreadyAttending,
    /// Actor may join immediately
    Joined,
    /// Actor may request to join; the host decides
    PendingApproval,
    /// Actor may not join
    Denied(DenyReason),
}

/// Host-level management operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManageOp {
    /// Edit title, time, description
    EditDetails,
    /// Change the privacy tier
    ChangeTier,
    /// Add or remove co-hosts
    ManageCoHosts,
    /// Delete the event
    Delete,
    /// Hand the event to another host
    TransferOwnership,
}

/// The bundle that actually applies to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveBundle {
    /// The event's current tier
    pub tier: PrivacyTier,
    /// Whether the tier is one the catalog knows
    pub tier_recognized: bool,
    /// Catalog bundle for the tier, before overrides
    pub tier_default: PermissionBundle,
    /// Tier default narrowed by the event's overrides
    pub bundle: PermissionBundle,
}

/// Stateless evaluator over an injected policy catalog.
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    catalog: Arc<PolicyCatalog>,
}

impl PermissionEvaluator {
    /// Create an evaluator over `catalog`.
    pub fn new(catalog: PolicyCatalog) -> Self {
        Self::from_shared(Arc::new(catalog))
    }

    /// Create an evaluator sharing an existing catalog.
    pub fn from_shared(catalog: Arc<PolicyCatalog>) -> Self {
        Self { catalog }
    }

    /// Create an evaluator over the built-in presets.
    pub fn with_defaults() -> Self {
        Self::new(PolicyCatalog::presets())
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Shared handle to the catalog in use.
    pub fn shared_catalog(&self) -> Arc<PolicyCatalog> {
        Arc::clone(&self.catalog)
    }

    /// Resolve the tier and apply overrides, logging every unrecognized value.
    pub fn effective_bundle(&self, event: &Event) -> EffectiveBundle {
        let tier = event.privacy_tier.clone();
        let (tier_recognized, tier_default) = match self.catalog.bundle_for(&tier) {
            Some(bundle) => (true, bundle.clone()),
            None => {
                warn!(
                    event_id = %event.id,
                    field = "privacy_tier",
                    value = %tier,
                    "Policy configuration defect: unrecognized tier, applying most restrictive bundle"
                );
                (false, PermissionBundle::most_restrictive())
            }
        };

        for (field, value) in tier_default.unrecognized_values() {
            warn!(
                event_id = %event.id,
                tier = %tier,
                field,
                value = %value,
                "Policy configuration defect: unrecognized catalog value"
            );
        }
        for (field, value) in event.overrides.unrecognized_values() {
            warn!(
                event_id = %event.id,
                field,
                value = %value,
                "Policy configuration defect: unrecognized override value"
            );
        }

        let bundle = tier_default.narrowed_by(&event.overrides);
        EffectiveBundle {
            tier,
            tier_recognized,
            tier_default,
            bundle,
        }
    }

    /// Decide `action` for an actor with `facts` on `event`.
    pub fn decide(&self, event: &Event, facts: &ActorFacts, action: Action) -> Decision {
        let effective = self.effective_bundle(event);
        Self::decide_with(&effective, facts, action)
    }

    /// Decide against an already resolved bundle.
    pub fn decide_with(
        effective: &EffectiveBundle,
        facts: &ActorFacts,
        action: Action,
    ) -> Decision {
        if facts.is_staff() {
            return Decision::Allow;
        }
        if !effective.tier_recognized {
            return Decision::Deny(DenyReason::PolicyConfiguration);
        }
        match action {
            Action::View => view_decision(&effective.bundle, facts),
            Action::Join => join_decision(&effective.bundle, facts),
            Action::Invite => invite_decision(effective, facts),
            Action::Share => share_decision(&effective.bundle, facts),
        }
    }

    /// Whether `action` is allowed.
    pub fn evaluate(&self, event: &Event, facts: &ActorFacts, action: Action) -> bool {
        self.decide(event, facts, action).is_allowed()
    }

    /// Whether the actor may view the event.
    pub fn can_view(&self, event: &Event, facts: &ActorFacts) -> bool {
        self.evaluate(event, facts, Action::View)
    }

    /// Whether the actor is eligible to join.
    pub fn can_join(&self, event: &Event, facts: &ActorFacts) -> bool {
        self.evaluate(event, facts, Action::Join)
    }

    /// Whether the actor may invite others.
    pub fn can_invite(&self, event: &Event, facts: &ActorFacts) -> bool {
        self.evaluate(event, facts, Action::Invite)
    }

    /// Whether the actor may share the event.
    pub fn can_share(&self, event: &Event, facts: &ActorFacts) -> bool {
        self.evaluate(event, facts, Action::Share)
    }

    /// Derive facts and decide in one step.
    ///
    /// `Err` means the event record is malformed; callers must treat it as a
    /// denial and report it as a server-side failure.
    pub fn evaluate_permission(
        &self,
        event: &Event,
        actor: &Actor,
        friends: &FriendSet,
        action: Action,
    ) -> ConveneResult<bool> {
        let facts = ActorFacts::derive(event, actor, friends)?;
        Ok(self.evaluate(event, &facts, action))
    }

    /// What joining would do for this actor.
    pub fn join_outcome(&self, event: &Event, facts: &ActorFacts) -> JoinOutcome {
        if facts.is_attendee {
            return JoinOutcome::AlreadyAttending;
        }
        let effective = self.effective_bundle(event);
        match Self::decide_with(&effective, facts, Action::Join) {
            Decision::Deny(reason) => JoinOutcome::Denied(reason),
            Decision::Allow if facts.is_staff() => JoinOutcome::Joined,
            Decision::Allow => match effective.bundle.can_join {
                JoinPermission::ApprovalRequired => JoinOutcome::PendingApproval,
                _ => JoinOutcome::Joined,
            },
        }
    }

    /// Whether the actor may see who is attending.
    pub fn can_view_attendees(&self, event: &Event, facts: &ActorFacts) -> bool {
        if facts.is_staff() {
            return true;
        }
        let effective = self.effective_bundle(event);
        if !Self::decide_with(&effective, facts, Action::View).is_allowed() {
            return false;
        }
        facts.is_attendee || effective.bundle.show_attendees_to_public
    }

    /// Whether the actor may see photos posted to the event.
    pub fn can_view_photos(&self, event: &Event, facts: &ActorFacts) -> bool {
        if facts.is_staff() {
            return true;
        }
        let effective = self.effective_bundle(event);
        if !Self::decide_with(&effective, facts, Action::View).is_allowed() {
            return false;
        }
        facts.is_attendee || effective.bundle.can_view == ViewPermission::Anyone
    }

    /// Whether the actor may perform a host-level operation.
    ///
    /// Co-hosts hold every host right except deletion and ownership transfer.
    pub fn can_manage(facts: &ActorFacts, op: ManageOp) -> bool {
        if facts.is_host {
            return true;
        }
        facts.is_co_host && !matches!(op, ManageOp::Delete | ManageOp::TransferOwnership)
    }
}

impl Default for PermissionEvaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn view_decision(bundle: &PermissionBundle, facts: &ActorFacts) -> Decision {
    let allowed = match &bundle.can_view {
        ViewPermission::Unrecognized(_) => {
            return Decision::Deny(DenyReason::PolicyConfiguration);
        }
        _ if facts.is_attendee => true,
        ViewPermission::Anyone => true,
        ViewPermission::Followers => facts.is_friend_of_host,
        ViewPermission::Invitees => facts.is_invited,
        ViewPermission::HostOnly => false,
    };
    if allowed {
        return Decision::Allow;
    }
    // Guest tokens stand in for the friend/invite relationship, never for staff.
    if facts.is_guest_token_holder && bundle.can_view != ViewPermission::HostOnly {
        return Decision::Allow;
    }
    Decision::Deny(DenyReason::NotPermitted)
}

fn join_decision(bundle: &PermissionBundle, facts: &ActorFacts) -> Decision {
    if !bundle.can_join.is_recognized() {
        return Decision::Deny(DenyReason::PolicyConfiguration);
    }
    if facts.is_guest_token_holder {
        return Decision::Deny(DenyReason::GuestScope);
    }
    if let deny @ Decision::Deny(_) = view_decision(bundle, facts) {
        return deny;
    }
    if facts.is_attendee {
        return Decision::Allow;
    }
    Decision::from_bool(match &bundle.can_join {
        JoinPermission::Anyone | JoinPermission::ApprovalRequired => true,
        JoinPermission::Followers => facts.is_friend_of_host,
        JoinPermission::Invited => facts.is_invited,
        JoinPermission::Unrecognized(_) => false,
    })
}

fn invite_decision(effective: &EffectiveBundle, facts: &ActorFacts) -> Decision {
    let bundle = &effective.bundle;
    if !bundle.can_invite.is_recognized() {
        return Decision::Deny(DenyReason::PolicyConfiguration);
    }
    if facts.is_guest_token_holder {
        return Decision::Deny(DenyReason::GuestScope);
    }
    if let deny @ Decision::Deny(_) = view_decision(bundle, facts) {
        return deny;
    }
    // Closed tiers keep invitations with the host and co-hosts regardless of
    // what the bundle says.
    if effective.tier != PrivacyTier::Public {
        return Decision::Deny(DenyReason::NotPermitted);
    }
    Decision::from_bool(match &bundle.can_invite {
        InvitePermission::Anyone => true,
        InvitePermission::Attendees => facts.is_attendee,
        InvitePermission::HostCohost
        | InvitePermission::HostOnly
        | InvitePermission::Unrecognized(_) => false,
    })
}

fn share_decision(bundle: &PermissionBundle, facts: &ActorFacts) -> Decision {
    if !bundle.can_share.is_recognized() {
        return Decision::Deny(DenyReason::PolicyConfiguration);
    }
    if facts.is_guest_token_holder {
        return Decision::Deny(DenyReason::GuestScope);
    }
    if let deny @ Decision::Deny(_) = view_decision(bundle, facts) {
        return deny;
    }
    Decision::from_bool(match &bundle.can_share {
        SharePermission::Anyone => true,
        SharePermission::Attendees | SharePermission::CoHosts | SharePermission::HostOnly => {
            facts.is_attendee
        }
        SharePermission::Unrecognized(_) => false,
    })
}
