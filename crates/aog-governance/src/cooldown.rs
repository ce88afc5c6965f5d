//! Cooldown tracking
//!
//! Stamps each target when an operation is attempted and answers how
//! long ago that was. The decision engine turns the elapsed time into
//! its `cooldown_period_not_elapsed` short-circuit. Measured from the
//! last *attempted* operation, so a failed execution restarts the
//! clock too.

use aog_policy::TargetId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Last-attempt timestamps per target
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_attempt: DashMap<TargetId, DateTime<Utc>>,
}

impl CooldownTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp an attempted operation
    pub fn record_attempt(&self, target: &TargetId, at: DateTime<Utc>) {
        self.last_attempt.insert(target.clone(), at);
    }

    /// Time since the last attempt, `None` when none was recorded
    ///
    /// A stamp in the future (clock skew) reads as zero elapsed, which
    /// keeps the cooldown conservative rather than skipping it.
    #[must_use]
    pub fn elapsed_since_last_attempt(
        &self,
        target: &TargetId,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let last = self.last_attempt.get(target)?;
        Some((now - *last).to_std().unwrap_or(Duration::ZERO))
    }

    /// Forget a target's stamp
    pub fn clear(&self, target: &TargetId) {
        self.last_attempt.remove(target);
    }
}
