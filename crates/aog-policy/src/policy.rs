//! Per-target policy model
//!
//! A [`Policy`] is the strongly-typed form of one target's blueprint
//! section: scaling thresholds and weights, resource targets, failure
//! recovery limits, circuit-breaker tuning, governance tiers, and
//! post-execution verification targets. It is loaded once per decision
//! cycle and treated as immutable for the duration of that cycle.
//!
//! Defaults are deliberately conservative; [`Policy::validate`] rejects
//! configurations that would make the decision rules meaningless.

use crate::action::ActionKind;
use crate::error::PolicyError;
use crate::field::PolicyField;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tolerance when checking that metric weights sum to 1.0.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Weights applied to each metric when computing weighted utilization
///
/// Valid weights each lie in `[0, 1]` and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricWeights {
    /// Weight for CPU utilization
    pub cpu: f64,
    /// Weight for memory utilization
    pub memory: f64,
    /// Weight for normalized latency
    pub latency: f64,
}

impl MetricWeights {
    /// Create a new weight set
    #[inline]
    #[must_use]
    pub const fn new(cpu: f64, memory: f64, latency: f64) -> Self {
        Self { cpu, memory, latency }
    }

    /// Sum of all weights
    #[inline]
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.cpu + self.memory + self.latency
    }
}

impl Default for MetricWeights {
    fn default() -> Self {
        Self::new(0.5, 0.3, 0.2)
    }
}

/// Replica scaling thresholds for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Lowest replica count the engine may propose
    pub min_replicas: u32,
    /// Highest replica count the engine may propose
    pub max_replicas: u32,
    /// Weighted utilization above which a scale-up is proposed
    pub scale_up_threshold: f64,
    /// Weighted utilization below which a scale-down is proposed
    pub scale_down_threshold: f64,
    /// Metric weights for the weighted utilization score
    pub weights: MetricWeights,
    /// Minimum seconds between two attempted operations on this target
    pub cooldown_secs: u64,
}

impl ScalingPolicy {
    /// Cooldown as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            min_replicas: 1,
            max_replicas: 10,
            scale_up_threshold: 0.80,
            scale_down_threshold: 0.30,
            weights: MetricWeights::default(),
            cooldown_secs: 300,
        }
    }
}

/// Resource request optimization targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    /// Desired CPU usage/request ratio
    pub cpu_target_utilization: f64,
    /// Desired memory usage/request ratio
    pub memory_target_utilization: f64,
    /// Relative request change below which no recommendation is emitted
    pub optimization_threshold: f64,
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            cpu_target_utilization: 0.65,
            memory_target_utilization: 0.75,
            optimization_threshold: 0.15,
        }
    }
}

/// Failure recovery limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    /// Restart count at which recovery escalates to a human
    pub max_restart_count: u32,
    /// Restart count at which an automated rollback is proposed
    pub rollback_threshold: u32,
    /// Whether automated rollback on repeated failure is enabled
    pub rollback_on_failure: bool,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_restart_count: 5,
            rollback_threshold: 3,
            rollback_on_failure: true,
        }
    }
}

/// Circuit breaker tuning for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerPolicy {
    /// Failures within the window that trip the breaker
    pub failure_threshold: u32,
    /// Sliding window over which failures are counted, seconds
    pub failure_window_secs: u64,
    /// Seconds an open breaker blocks before permitting a probe
    pub reset_timeout_secs: u64,
}

impl BreakerPolicy {
    /// Failure window as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }

    /// Reset timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_secs)
    }
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            failure_window_secs: 600,
            reset_timeout_secs: 300,
        }
    }
}

/// Governance tiers and automation limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernancePolicy {
    /// Action kinds that are never auto-executed, no exceptions
    pub forbidden_actions: Vec<ActionKind>,
    /// Action kinds that always require human approval
    pub restricted_actions: Vec<ActionKind>,
    /// Largest replica delta allowed without approval
    pub max_scale_step: u32,
    /// Largest relative resource-request change allowed without approval
    pub max_resource_delta: f64,
    /// Executed-operation budget per rolling hour before downgrading to approval
    pub max_operations_per_hour: u32,
    /// Seconds a pending approval request stays open before expiring
    pub approval_timeout_secs: u64,
    /// Channel approval requests are routed to
    pub approver_channel: String,
}

impl GovernancePolicy {
    /// Approval timeout as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_secs)
    }
}

impl Default for GovernancePolicy {
    fn default() -> Self {
        Self {
            forbidden_actions: vec![ActionKind::DeleteDeployment],
            restricted_actions: vec![ActionKind::RollbackDeployment],
            max_scale_step: 1,
            max_resource_delta: 0.30,
            max_operations_per_hour: 10,
            approval_timeout_secs: 3600,
            approver_channel: "ops-approvals".to_string(),
        }
    }
}

/// Post-execution verification targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationPolicy {
    /// Latency p95 target in milliseconds; also normalizes latency for scaling
    pub latency_target_ms: f64,
    /// Error rate ceiling (fraction of requests)
    pub max_error_rate: f64,
    /// Minimum acceptable availability (fraction)
    pub min_availability: f64,
    /// Seconds to wait after execution before re-sampling metrics
    pub stabilization_secs: u64,
}

impl VerificationPolicy {
    /// Stabilization wait as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn stabilization(&self) -> Duration {
        Duration::from_secs(self.stabilization_secs)
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            latency_target_ms: 500.0,
            max_error_rate: 0.01,
            min_availability: 0.95,
            stabilization_secs: 60,
        }
    }
}

/// Complete per-target policy
///
/// Read-only to the decision core; constructed by an external loader and
/// handed to the governor at registration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Policy {
    /// Replica scaling section
    pub scaling: ScalingPolicy,
    /// Resource optimization section
    pub resources: ResourcePolicy,
    /// Failure recovery section
    pub recovery: RecoveryPolicy,
    /// Circuit breaker section
    pub breaker: BreakerPolicy,
    /// Governance tiers section
    pub governance: GovernancePolicy,
    /// Verification targets section
    pub verification: VerificationPolicy,
}

impl Policy {
    /// Create a policy with default sections
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scaling section
    #[must_use]
    pub fn with_scaling(mut self, scaling: ScalingPolicy) -> Self {
        self.scaling = scaling;
        self
    }

    /// Replace the resources section
    #[must_use]
    pub fn with_resources(mut self, resources: ResourcePolicy) -> Self {
        self.resources = resources;
        self
    }

    /// Replace the recovery section
    #[must_use]
    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    /// Replace the breaker section
    #[must_use]
    pub fn with_breaker(mut self, breaker: BreakerPolicy) -> Self {
        self.breaker = breaker;
        self
    }

    /// Replace the governance section
    #[must_use]
    pub fn with_governance(mut self, governance: GovernancePolicy) -> Self {
        self.governance = governance;
        self
    }

    /// Replace the verification section
    #[must_use]
    pub fn with_verification(mut self, verification: VerificationPolicy) -> Self {
        self.verification = verification;
        self
    }

    /// Whether a kind is in the forbidden list
    #[inline]
    #[must_use]
    pub fn is_forbidden(&self, kind: ActionKind) -> bool {
        self.governance.forbidden_actions.contains(&kind)
    }

    /// Whether a kind is in the restricted list
    #[inline]
    #[must_use]
    pub fn is_restricted(&self, kind: ActionKind) -> bool {
        self.governance.restricted_actions.contains(&kind)
    }

    /// Validate every section, returning the first violation found
    ///
    /// # Errors
    /// Returns a [`PolicyError`] naming the offending field.
    pub fn validate(&self) -> Result<(), PolicyError> {
        self.validate_scaling()?;
        self.validate_resources()?;
        self.validate_recovery()?;
        self.validate_breaker()?;
        self.validate_governance()?;
        self.validate_verification()?;
        Ok(())
    }

    fn validate_scaling(&self) -> Result<(), PolicyError> {
        let s = &self.scaling;
        if s.min_replicas > s.max_replicas {
            return Err(PolicyError::ReplicaBounds {
                min: s.min_replicas,
                max: s.max_replicas,
            });
        }
        for (field, value) in [
            (PolicyField::ScaleUpThreshold, s.scale_up_threshold),
            (PolicyField::ScaleDownThreshold, s.scale_down_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(PolicyError::InvalidValue {
                    field,
                    reason: format!("{value} is outside (0, 1)"),
                });
            }
        }
        if s.scale_down_threshold >= s.scale_up_threshold {
            return Err(PolicyError::ThresholdOrder {
                down: s.scale_down_threshold,
                up: s.scale_up_threshold,
            });
        }
        let w = &s.weights;
        for component in [w.cpu, w.memory, w.latency] {
            if !component.is_finite() || !(0.0..=1.0).contains(&component) {
                return Err(PolicyError::InvalidValue {
                    field: PolicyField::MetricWeights,
                    reason: format!("weight {component} is outside [0, 1]"),
                });
            }
        }
        if (w.sum() - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(PolicyError::WeightSum { sum: w.sum() });
        }
        Ok(())
    }

    fn validate_resources(&self) -> Result<(), PolicyError> {
        let r = &self.resources;
        for (field, value) in [
            (PolicyField::CpuTargetUtilization, r.cpu_target_utilization),
            (PolicyField::MemoryTargetUtilization, r.memory_target_utilization),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(PolicyError::InvalidValue {
                    field,
                    reason: format!("{value} is outside (0, 1]"),
                });
            }
        }
        if !r.optimization_threshold.is_finite() || r.optimization_threshold <= 0.0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::OptimizationThreshold,
                reason: format!("{} must be positive", r.optimization_threshold),
            });
        }
        Ok(())
    }

    fn validate_recovery(&self) -> Result<(), PolicyError> {
        if self.recovery.max_restart_count == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::MaxRestartCount,
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validate_breaker(&self) -> Result<(), PolicyError> {
        let b = &self.breaker;
        if b.failure_threshold == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::FailureThreshold,
                reason: "must be at least 1".to_string(),
            });
        }
        if b.failure_window_secs == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::FailureWindowSecs,
                reason: "must be at least 1 second".to_string(),
            });
        }
        if b.reset_timeout_secs == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::ResetTimeoutSecs,
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }

    fn validate_governance(&self) -> Result<(), PolicyError> {
        let g = &self.governance;
        if g.max_scale_step == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::MaxScaleStep,
                reason: "must be at least 1".to_string(),
            });
        }
        if !g.max_resource_delta.is_finite() || g.max_resource_delta <= 0.0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::MaxResourceDelta,
                reason: format!("{} must be positive", g.max_resource_delta),
            });
        }
        if g.max_operations_per_hour == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::MaxOperationsPerHour,
                reason: "must be at least 1".to_string(),
            });
        }
        if g.approval_timeout_secs == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::ApprovalTimeoutSecs,
                reason: "must be at least 1 second".to_string(),
            });
        }
        if g.approver_channel.is_empty() {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::ApproverChannel,
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn validate_verification(&self) -> Result<(), PolicyError> {
        let v = &self.verification;
        if !v.latency_target_ms.is_finite() || v.latency_target_ms <= 0.0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::LatencyTargetMs,
                reason: format!("{} must be positive", v.latency_target_ms),
            });
        }
        if !v.max_error_rate.is_finite() || !(0.0..=1.0).contains(&v.max_error_rate) {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::MaxErrorRate,
                reason: format!("{} is outside [0, 1]", v.max_error_rate),
            });
        }
        if !v.min_availability.is_finite() || !(0.0..=1.0).contains(&v.min_availability) {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::MinAvailability,
                reason: format!("{} is outside [0, 1]", v.min_availability),
            });
        }
        if v.stabilization_secs == 0 {
            return Err(PolicyError::InvalidValue {
                field: PolicyField::StabilizationSecs,
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_validates() {
        assert!(Policy::default().validate().is_ok());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut policy = Policy::default();
        policy.scaling.weights = MetricWeights::new(0.5, 0.3, 0.5);
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::WeightSum { .. })
        ));
    }

    #[test]
    fn weight_outside_unit_interval_rejected() {
        let mut policy = Policy::default();
        policy.scaling.weights = MetricWeights::new(1.5, -0.3, -0.2);
        let err = policy.validate().unwrap_err();
        assert_eq!(err.field(), PolicyField::MetricWeights);
    }

    #[test]
    fn inverted_replica_bounds_rejected() {
        let mut policy = Policy::default();
        policy.scaling.min_replicas = 8;
        policy.scaling.max_replicas = 2;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::ReplicaBounds { min: 8, max: 2 })
        ));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let mut policy = Policy::default();
        policy.scaling.scale_down_threshold = 0.9;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let mut policy = Policy::default();
        policy.scaling.scale_up_threshold = f64::NAN;
        let err = policy.validate().unwrap_err();
        assert_eq!(err.field(), PolicyField::ScaleUpThreshold);
    }

    #[test]
    fn zero_failure_threshold_rejected() {
        let mut policy = Policy::default();
        policy.breaker.failure_threshold = 0;
        let err = policy.validate().unwrap_err();
        assert_eq!(err.field(), PolicyField::FailureThreshold);
    }

    #[test]
    fn empty_approver_channel_rejected() {
        let mut policy = Policy::default();
        policy.governance.approver_channel = String::new();
        let err = policy.validate().unwrap_err();
        assert_eq!(err.field(), PolicyField::ApproverChannel);
    }

    #[test]
    fn builders_replace_sections() {
        let policy = Policy::new()
            .with_scaling(ScalingPolicy {
                max_replicas: 5,
                ..ScalingPolicy::default()
            })
            .with_verification(VerificationPolicy {
                latency_target_ms: 200.0,
                ..VerificationPolicy::default()
            });
        assert_eq!(policy.scaling.max_replicas, 5);
        assert!((policy.verification.latency_target_ms - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn forbidden_and_restricted_lookups() {
        let policy = Policy::default();
        assert!(policy.is_forbidden(ActionKind::DeleteDeployment));
        assert!(!policy.is_forbidden(ActionKind::ScaleUp));
        assert!(policy.is_restricted(ActionKind::RollbackDeployment));
    }

    #[test]
    fn duration_accessors() {
        let policy = Policy::default();
        assert_eq!(policy.scaling.cooldown(), Duration::from_secs(300));
        assert_eq!(policy.breaker.failure_window(), Duration::from_secs(600));
        assert_eq!(policy.verification.stabilization(), Duration::from_secs(60));
    }

    #[test]
    fn policy_serde_round_trip() {
        let policy = Policy::default();
        let json = serde_json::to_string(&policy).unwrap();
        let back: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, back);
    }
}
