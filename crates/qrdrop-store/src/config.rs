use std::time::Duration as StdDuration;

use chrono::Duration;

use crate::error::{StoreError, StoreResult};

/// Longest reap interval accepted. Anything slower lets expired bytes pile up.
pub const MAX_REAP_INTERVAL: StdDuration = StdDuration::from_secs(60 * 60);

/// Longest expiration window accepted, in hours (ten years).
pub const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

/// Lifetime settings shared by every backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long a record stays visible after insertion.
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
        }
    }
}

impl StoreConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Build from a whole number of hours, failing instead of overflowing.
    pub fn with_ttl_hours(hours: i64) -> StoreResult<Self> {
        let config = Duration::try_hours(hours)
            .map(Self::with_ttl)
            .ok_or_else(|| {
                StoreError::InvalidConfig(format!("expiration window of {hours}h is out of range"))
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break `expires_at > created_at`.
    pub fn validate(&self) -> StoreResult<()> {
        if self.ttl <= Duration::zero() {
            return Err(StoreError::InvalidConfig(format!(
                "expiration window must be positive, got {}s",
                self.ttl.num_seconds()
            )));
        }
        if self.ttl > Duration::hours(MAX_TTL_HOURS) {
            return Err(StoreError::InvalidConfig(format!(
                "expiration window of {}h exceeds the {MAX_TTL_HOURS}h maximum",
                self.ttl.num_hours()
            )));
        }
        Ok(())
    }
}

/// Settings for the background [`crate::Reaper`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Time between sweeps.
    pub interval: StdDuration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_secs(5 * 60),
        }
    }
}

impl ReaperConfig {
    pub fn with_interval(interval: StdDuration) -> Self {
        Self { interval }
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.interval.is_zero() {
            return Err(StoreError::InvalidConfig(
                "reap interval must be non-zero".into(),
            ));
        }
        if self.interval > MAX_REAP_INTERVAL {
            return Err(StoreError::InvalidConfig(format!(
                "reap interval of {}s exceeds the {}s maximum",
                self.interval.as_secs(),
                MAX_REAP_INTERVAL.as_secs()
            )));
        }
        Ok(())
    }
}
