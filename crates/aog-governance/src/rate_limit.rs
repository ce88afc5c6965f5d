//! Rolling per-target operation budget
//!
//! Counts execution attempts over a fixed one-hour window. The
//! enforcer downgrades an otherwise-allowed verdict to restricted
//! once the window fills. Attempts count whether or not they
//! succeeded; a failing operation consumes budget the same way a
//! healthy one does.

use aog_policy::TargetId;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Tracks execution attempts per target over the last hour
#[derive(Debug, Default)]
pub struct RateLimiter {
    attempts: DashMap<TargetId, Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    /// Create an empty limiter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one execution attempt
    pub fn record(&self, target: &TargetId, at: DateTime<Utc>) {
        self.attempts.entry(target.clone()).or_default().push(at);
    }

    /// Attempts inside the rolling hour, pruning older entries
    #[must_use]
    pub fn count(&self, target: &TargetId, now: DateTime<Utc>) -> u32 {
        let Some(mut entry) = self.attempts.get_mut(target) else {
            return 0;
        };
        let cutoff = now - Duration::hours(1);
        entry.retain(|at| *at > cutoff);
        u32::try_from(entry.len()).unwrap_or(u32::MAX)
    }

    /// Forget a target's history
    pub fn clear(&self, target: &TargetId) {
        self.attempts.remove(target);
    }
}
