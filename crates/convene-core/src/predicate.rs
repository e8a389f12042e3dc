//! Storage-agnostic query predicates
//!
//! A [`Predicate`] is a small AND/OR/comparison tree over named event
//! [`Field`]s. Storage adapters translate it into their native query
//! language; [`Predicate::matches`] is the reference interpretation every
//! adapter must agree with.
//!
//! Field semantics:
//!
//! | field | kind | null when |
//! |---|---|---|
//! | `Tier` | text | never |
//! | `Host` | user | host missing |
//! | `CoHosts`, `Attendees`, `InvitedUsers` | set of users | never (empty set) |
//! | `ViewOverride` | text | no override |
//! | `FeedOverride`, `SearchOverride` | bool | no override |
//! | `StartsAt` | time | start time missing |
//! | `Category` | text | no category |
//!
//! Comparisons against a null field are false; use [`Predicate::IsNull`] to
//! test for absence.

use crate::event::Event;
use crate::identifiers::UserId;
use crate::policy::Surface;
use crate::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Event field addressable by a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Privacy tier
    Tier,
    /// Host
    Host,
    /// Co-host set
    CoHosts,
    /// Attendee set
    Attendees,
    /// Invitation list
    InvitedUsers,
    /// Per-event view override
    ViewOverride,
    /// Per-event feed opt-out
    FeedOverride,
    /// Per-event search opt-out
    SearchOverride,
    /// Start time
    StartsAt,
    /// Category
    Category,
}

impl Field {
    /// Override column governing a discovery surface.
    pub fn surface_override(surface: Surface) -> Self {
        match surface {
            Surface::Search => Self::SearchOverride,
            Surface::Feed => Self::FeedOverride,
        }
    }

    /// Storage-facing field name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tier => "privacy_tier",
            Self::Host => "host",
            Self::CoHosts => "co_hosts",
            Self::Attendees => "attendees",
            Self::InvitedUsers => "invited_users",
            Self::ViewOverride => "overrides.can_view",
            Self::FeedOverride => "overrides.appear_in_feed",
            Self::SearchOverride => "overrides.appear_in_search",
            Self::StartsAt => "starts_at",
            Self::Category => "category",
        }
    }
}

/// Literal value in a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Text
    Text(String),
    /// User identifier
    User(UserId),
    /// Boolean
    Bool(bool),
    /// Timestamp
    Time(PhysicalTime),
}

impl Value {
    /// Text literal.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::User(user) => write!(f, "{user}"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Time(time) => write!(f, "{time}"),
        }
    }
}

/// Filter condition over event fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Constant truth value
    Const {
        /// The constant
        value: bool,
    },
    /// Scalar field equals value
    Eq {
        /// Field compared
        field: Field,
        /// Expected value
        value: Value,
    },
    /// Scalar field is one of the values
    In {
        /// Field compared
        field: Field,
        /// Accepted values
        values: Vec<Value>,
    },
    /// Set field contains value
    Contains {
        /// Set-valued field
        field: Field,
        /// Member looked for
        value: Value,
    },
    /// Ordered field is at least value
    AtLeast {
        /// Field compared
        field: Field,
        /// Lower bound, inclusive
        value: Value,
    },
    /// Field is absent
    IsNull {
        /// Field tested
        field: Field,
    },
    /// Negation
    Not {
        /// Negated predicate
        inner: Box<Predicate>,
    },
    /// Conjunction
    And {
        /// All must hold
        all: Vec<Predicate>,
    },
    /// Disjunction
    Or {
        /// At least one must hold
        any: Vec<Predicate>,
    },
}

impl Predicate {
    /// Always true.
    pub fn always() -> Self {
        Self::Const { value: true }
    }

    /// Always false.
    pub fn never() -> Self {
        Self::Const { value: false }
    }

    /// `field = value`
    pub fn equals(field: Field, value: Value) -> Self {
        Self::Eq { field, value }
    }

    /// `field ∈ values`; an empty list is `never()`.
    pub fn is_in(field: Field, values: Vec<Value>) -> Self {
        if values.is_empty() {
            return Self::never();
        }
        Self::In { field, values }
    }

    /// `field ∋ value`
    pub fn contains(field: Field, value: Value) -> Self {
        Self::Contains { field, value }
    }

    /// `field ≥ value`
    pub fn at_least(field: Field, value: Value) -> Self {
        Self::AtLeast { field, value }
    }

    /// `field IS NULL`
    pub fn is_null(field: Field) -> Self {
        Self::IsNull { field }
    }

    /// Negation with constant folding.
    pub fn negate(inner: Predicate) -> Self {
        match inner {
            Self::Const { value } => Self::Const { value: !value },
            Self::Not { inner } => *inner,
            other => Self::Not {
                inner: Box::new(other),
            },
        }
    }

    /// Conjunction with constant folding and flattening.
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut all = Vec::new();
        for part in parts {
            match part {
                Self::Const { value: true } => {}
                Self::Const { value: false } => return Self::never(),
                Self::And { all: nested } => all.extend(nested),
                other => all.push(other),
            }
        }
        match all.len() {
            0 => Self::always(),
            1 => all.remove(0),
            _ => Self::And { all },
        }
    }

    /// Disjunction with constant folding and flattening.
    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut any = Vec::new();
        for part in parts {
            match part {
                Self::Const { value: false } => {}
                Self::Const { value: true } => return Self::always(),
                Self::Or { any: nested } => any.extend(nested),
                other => any.push(other),
            }
        }
        match any.len() {
            0 => Self::never(),
            1 => any.remove(0),
            _ => Self::Or { any },
        }
    }

    /// Whether this predicate folded to a constant.
    pub fn as_const(&self) -> Option<bool> {
        match self {
            Self::Const { value } => Some(*value),
            _ => None,
        }
    }

    /// Reference interpretation of the predicate against one event.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::Const { value } => *value,
            Self::Eq { field, value } => scalar(event, *field).is_some_and(|v| &v == value),
            Self::In { field, values } => {
                scalar(event, *field).is_some_and(|v| values.contains(&v))
            }
            Self::Contains { field, value } => match (members(event, *field), value) {
                (Some(set), Value::User(user)) => set.contains(user),
                _ => false,
            },
            Self::AtLeast { field, value } => match (scalar(event, *field), value) {
                (Some(Value::Time(actual)), Value::Time(bound)) => actual >= *bound,
                _ => false,
            },
            Self::IsNull { field } => {
                members(event, *field).is_none() && scalar(event, *field).is_none()
            }
            Self::Not { inner } => !inner.matches(event),
            Self::And { all } => all.iter().all(|p| p.matches(event)),
            Self::Or { any } => any.iter().any(|p| p.matches(event)),
        }
    }
}

fn scalar(event: &Event, field: Field) -> Option<Value> {
    match field {
        Field::Tier => Some(Value::text(event.privacy_tier.as_str())),
        Field::Host => event.host.map(Value::User),
        Field::ViewOverride => event
            .overrides
            .can_view
            .as_ref()
            .map(|v| Value::text(v.as_str())),
        Field::FeedOverride => event.overrides.appear_in_feed.map(Value::Bool),
        Field::SearchOverride => event.overrides.appear_in_search.map(Value::Bool),
        Field::StartsAt => event.starts_at.map(Value::Time),
        Field::Category => event.category.clone().map(Value::Text),
        Field::CoHosts | Field::Attendees | Field::InvitedUsers => None,
    }
}

fn members(event: &Event, field: Field) -> Option<&BTreeSet<UserId>> {
    match field {
        Field::CoHosts => Some(&event.co_hosts),
        Field::Attendees => Some(&event.attendees),
        Field::InvitedUsers => Some(&event.invited_users),
        _ => None,
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const { value } => write!(f, "{value}"),
            Self::Eq { field, value } => write!(f, "{} = {value}", field.name()),
            Self::In { field, values } => {
                write!(f, "{} IN [", field.name())?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            Self::Contains { field, value } => write!(f, "{} CONTAINS {value}", field.name()),
            Self::AtLeast { field, value } => write!(f, "{} >= {value}", field.name()),
            Self::IsNull { field } => write!(f, "{} IS NULL", field.name()),
            Self::Not { inner } => write!(f, "NOT ({inner})"),
            Self::And { all } => join(f, all, " AND "),
            Self::Or { any } => join(f, any, " OR "),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, parts: &[Predicate], separator: &str) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "({part})")?;
    }
    Ok(())
}
