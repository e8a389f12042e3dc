//! Wall-clock effects

use crate::time::PhysicalTime;
use async_trait::async_trait;

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Clock reading failed
    #[error("Time service unavailable: {reason}")]
    Unavailable {
        /// Why the clock could not be read
        reason: String,
    },
}

impl From<ClockError> for crate::ConveneError {
    fn from(err: ClockError) -> Self {
        crate::ConveneError::upstream_fetch("clock", err.to_string())
    }
}

/// Source of "now".
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current wall-clock time.
    async fn physical_time(&self) -> Result<PhysicalTime, ClockError>;
}

/// Production clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl PhysicalTimeEffects for SystemClock {
    async fn physical_time(&self) -> Result<PhysicalTime, ClockError> {
        #[allow(clippy::disallowed_methods)]
        let now = std::time::SystemTime::now();
        let elapsed = now
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| ClockError::Unavailable {
                reason: e.to_string(),
            })?;
        let ts_ms = u64::try_from(elapsed.as_millis()).map_err(|e| ClockError::Unavailable {
            reason: e.to_string(),
        })?;
        Ok(PhysicalTime::from_millis(ts_ms))
    }
}
