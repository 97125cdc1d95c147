use chrono::{DateTime, TimeDelta, Utc};

/// 默认过期阈值：15分钟
pub const DEFAULT_STALE_AFTER_SECS: i64 = 15 * 60;

/// Decides whether a reported position is still current.
///
/// A single value is built from config at startup and shared by every query,
/// so tests can swap in a different threshold or feed a synthetic `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    threshold: TimeDelta,
}

impl Freshness {
    pub fn new(threshold: TimeDelta) -> Self {
        Self { threshold }
    }

    /// `None` unless `secs` is positive and representable as a `TimeDelta`.
    pub fn try_from_secs(secs: i64) -> Option<Self> {
        if secs <= 0 {
            return None;
        }
        TimeDelta::try_seconds(secs).map(Self::new)
    }

    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    /// Fresh iff `now - last_update` is strictly below the threshold.
    /// A missing timestamp is never fresh.
    pub fn is_fresh(&self, last_update: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_update {
            Some(at) => now.signed_duration_since(at) < self.threshold,
            None => false,
        }
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_STALE_AFTER_SECS))
    }
}
