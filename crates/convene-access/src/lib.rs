//! Convene Access - Event Access Control
//!
//! Decides who may see and act on an event, and which events surface for a
//! user on search and feed:
//!
//! - Policy catalog: `PolicyCatalog`, the single tier → bundle table
//! - Actor facts: `Actor`, `ActorFacts` derived per (event, actor)
//! - Evaluation: `PermissionEvaluator` for view/join/invite/share and host rights
//! - Visibility: `VisibilityFilter` over candidate sets, `DiscoveryOptions`
//! - Discovery: `DiscoveryPredicateBuilder` producing storage predicates
//! - Friends: `FriendSet` resolved from the friend graph, confirmed both ways
//!
//! # Architecture
//!
//! Everything except `FriendSet` resolution is synchronous and pure. The
//! catalog is injected, shared through an `Arc`, and never mutated after
//! construction.
//!
//! # Example
//!
//! ```ignore
//! use convene_access::{Action, Actor, FriendSet, PermissionEvaluator};
//!
//! let evaluator = PermissionEvaluator::with_defaults();
//! let friends = FriendSet::resolve(&graph, &viewer).await;
//! let actor = Actor::User(viewer);
//! let allowed = evaluator.evaluate_permission(&event, &actor, &friends, Action::View)?;
//! ```

pub mod catalog;
pub mod discovery;
pub mod evaluator;
pub mod facts;
pub mod friends;
pub mod memory;
pub mod visibility;

// Re-export primary types
pub use catalog::PolicyCatalog;
pub use discovery::DiscoveryPredicateBuilder;
pub use evaluator::{
    Action, Decision, DenyReason, EffectiveBundle, JoinOutcome, ManageOp, PermissionEvaluator,
};
pub use facts::{Actor, ActorFacts};
pub use friends::FriendSet;
pub use memory::{MemoryEventStore, MemoryFriendGraph, MemoryGuestTokens};
pub use visibility::{DiscoveryOptions, VisibilityFilter};
