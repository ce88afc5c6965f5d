//! Verification outcome types
//!
//! A [`VerificationResult`] compares one re-sampled snapshot against the
//! policy's health thresholds, dimension by dimension. Dimensions the
//! snapshot did not measure are recorded as unmeasured, never as
//! failures; only an observed violation can trigger a rollback.

use aog_metrics::MetricSnapshot;
use aog_policy::{TargetId, VerificationPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pass, fail, or no data for one verified dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Observed value satisfied the threshold
    Pass,
    /// Observed value violated the threshold
    Fail,
    /// The snapshot carried no reading for this dimension
    Unmeasured,
}

/// One numeric dimension compared against its policy threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionCheck {
    /// Outcome of the comparison
    pub state: CheckState,
    /// Value observed in the snapshot, when present
    pub observed: Option<f64>,
    /// Threshold the value was compared against
    pub threshold: f64,
}

impl DimensionCheck {
    /// Compare against a ceiling; strictly above fails, equal passes
    #[must_use]
    pub fn ceiling(observed: Option<f64>, max: f64) -> Self {
        let state = match observed {
            Some(v) if v > max => CheckState::Fail,
            Some(_) => CheckState::Pass,
            None => CheckState::Unmeasured,
        };
        Self {
            state,
            observed,
            threshold: max,
        }
    }

    /// Compare against a floor; strictly below fails, equal passes
    #[must_use]
    pub fn floor(observed: Option<f64>, min: f64) -> Self {
        let state = match observed {
            Some(v) if v < min => CheckState::Fail,
            Some(_) => CheckState::Pass,
            None => CheckState::Unmeasured,
        };
        Self {
            state,
            observed,
            threshold: min,
        }
    }

    /// True when this dimension violated its threshold
    #[inline]
    #[must_use]
    pub fn failed(&self) -> bool {
        self.state == CheckState::Fail
    }
}

/// The boolean pod-health dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Outcome of the check
    pub state: CheckState,
    /// Reported flag, when present
    pub observed: Option<bool>,
}

impl HealthCheck {
    /// Classify the reported all-pods-healthy flag
    #[must_use]
    pub fn from_flag(observed: Option<bool>) -> Self {
        let state = match observed {
            Some(true) => CheckState::Pass,
            Some(false) => CheckState::Fail,
            None => CheckState::Unmeasured,
        };
        Self { state, observed }
    }

    /// True when pods reported unhealthy
    #[inline]
    #[must_use]
    pub fn failed(&self) -> bool {
        self.state == CheckState::Fail
    }
}

/// Per-dimension health comparison for one post-execution snapshot
///
/// Deterministic in the snapshot: `observed_at` is the snapshot's own
/// timestamp, so verifying the same snapshot twice yields equal
/// results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Target the snapshot was taken from
    pub target: TargetId,
    /// When the verified snapshot was taken
    pub observed_at: DateTime<Utc>,
    /// p95 latency against the policy target (ceiling)
    pub latency_p95: DimensionCheck,
    /// Error rate against the policy maximum (ceiling)
    pub error_rate: DimensionCheck,
    /// Availability against the policy minimum (floor)
    pub availability: DimensionCheck,
    /// Reported pod health
    pub pods_healthy: HealthCheck,
}

impl VerificationResult {
    /// A result for a target whose metrics could not be re-sampled
    ///
    /// Every dimension is unmeasured; the result passes. An absent
    /// pipeline is not evidence of a failed operation.
    #[must_use]
    pub fn unmeasured(
        target: TargetId,
        policy: &VerificationPolicy,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            target,
            observed_at,
            latency_p95: DimensionCheck::ceiling(None, policy.latency_target_ms),
            error_rate: DimensionCheck::ceiling(None, policy.max_error_rate),
            availability: DimensionCheck::floor(None, policy.min_availability),
            pods_healthy: HealthCheck::from_flag(None),
        }
    }

    /// True when no dimension observed a violation
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.failed()
    }

    /// True when at least one dimension observed a violation
    #[must_use]
    pub fn failed(&self) -> bool {
        self.latency_p95.failed()
            || self.error_rate.failed()
            || self.availability.failed()
            || self.pods_healthy.failed()
    }

    /// Names of the dimensions that failed
    #[must_use]
    pub fn failed_dimensions(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.latency_p95.failed() {
            names.push("latency_p95_ms");
        }
        if self.error_rate.failed() {
            names.push("error_rate");
        }
        if self.availability.failed() {
            names.push("availability");
        }
        if self.pods_healthy.failed() {
            names.push("all_pods_healthy");
        }
        names
    }

    /// Human-readable account of the violations, for breaker reasons
    /// and escalation summaries
    #[must_use]
    pub fn describe_failures(&self) -> String {
        let mut parts = Vec::new();
        if self.latency_p95.failed() {
            parts.push(format!(
                "latency_p95_ms {:.1} above target {:.1}",
                self.latency_p95.observed.unwrap_or_default(),
                self.latency_p95.threshold
            ));
        }
        if self.error_rate.failed() {
            parts.push(format!(
                "error_rate {:.4} above limit {:.4}",
                self.error_rate.observed.unwrap_or_default(),
                self.error_rate.threshold
            ));
        }
        if self.availability.failed() {
            parts.push(format!(
                "availability {:.4} below minimum {:.4}",
                self.availability.observed.unwrap_or_default(),
                self.availability.threshold
            ));
        }
        if self.pods_healthy.failed() {
            parts.push("pods reporting unhealthy".to_string());
        }
        parts.join("; ")
    }
}

/// Compare one snapshot against the verification thresholds
///
/// Pure and idempotent: no I/O, no clock reads. The controller calls
/// this with the re-sampled snapshot after the stabilization wait.
#[must_use]
pub fn verify(snapshot: &MetricSnapshot, policy: &VerificationPolicy) -> VerificationResult {
    VerificationResult {
        target: snapshot.target.clone(),
        observed_at: snapshot.taken_at,
        latency_p95: DimensionCheck::ceiling(snapshot.latency_p95_ms, policy.latency_target_ms),
        error_rate: DimensionCheck::ceiling(snapshot.error_rate, policy.max_error_rate),
        availability: DimensionCheck::floor(snapshot.availability, policy.min_availability),
        pods_healthy: HealthCheck::from_flag(snapshot.all_pods_healthy),
    }
}
