//! Convene Core - Shared Types and Effect Traits
//!
//! Foundation crate for the Convene event access engine. It holds the types
//! every other crate agrees on and nothing with policy in it:
//!
//! - Identifiers: [`UserId`], [`EventId`]
//! - The stored [`Event`] record and its privacy values ([`policy`])
//! - The storage-agnostic [`Predicate`] vocabulary and its reference interpreter
//! - The unified [`ConveneError`]
//! - Configuration loading ([`ConfigSource`])
//! - Effect traits for the friend graph, event store, guest tokens and clock
//!
//! # Architecture
//!
//! ```text
//! convene-core   (types, effects)
//!     ↑
//! convene-access (policy catalog, evaluator, visibility, predicate builder)
//!     ↑
//! convene-feed   (ranking, pagination, discovery service)
//! ```

pub mod config;
pub mod effects;
pub mod errors;
pub mod event;
pub mod identifiers;
pub mod policy;
pub mod predicate;
pub mod time;

pub use config::ConfigSource;
pub use errors::{ConveneError, ConveneResult};
pub use event::Event;
pub use identifiers::{EventId, UserId};
pub use policy::{
    InvitePermission, JoinPermission, PermissionBundle, PermissionOverrides, PrivacyTier,
    SharePermission, Surface, ViewPermission,
};
pub use predicate::{Field, Predicate, Value};
pub use time::PhysicalTime;
