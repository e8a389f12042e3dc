//! Physical time
//!
//! Event start times and "now" are both millisecond wall-clock timestamps.
//! "Now" is read once per request through
//! [`PhysicalTimeEffects`](crate::effects::PhysicalTimeEffects) and passed
//! down as a value, so every signal in one ranking pass sees the same instant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one hour.
pub const MS_PER_HOUR: u64 = 60 * 60 * 1000;
/// Milliseconds in one day.
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Wall-clock timestamp in milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct PhysicalTime {
    /// Milliseconds since the Unix epoch
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// Timestamp `ms` milliseconds later, saturating.
    pub fn plus_millis(self, ms: u64) -> Self {
        Self {
            ts_ms: self.ts_ms.saturating_add(ms),
        }
    }

    /// Timestamp `days` days later, saturating.
    pub fn plus_days(self, days: u64) -> Self {
        self.plus_millis(days.saturating_mul(MS_PER_DAY))
    }

    /// Signed distance from `self` to `later` in milliseconds.
    ///
    /// Negative when `later` is actually in the past relative to `self`.
    pub fn millis_until(self, later: PhysicalTime) -> i128 {
        i128::from(later.ts_ms) - i128::from(self.ts_ms)
    }
}

impl fmt::Display for PhysicalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.ts_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_until_signed() {
        let now = PhysicalTime::from_millis(1_700_000_000_000);
        assert_eq!(now.millis_until(now.plus_days(1)), i128::from(MS_PER_DAY));
        assert_eq!(
            now.plus_days(1).millis_until(now),
            -i128::from(MS_PER_DAY)
        );
    }

    #[test]
    fn test_plus_saturates() {
        let t = PhysicalTime::from_millis(u64::MAX - 1);
        assert_eq!(t.plus_days(3).ts_ms, u64::MAX);
    }
}
