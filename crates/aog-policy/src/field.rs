//! Policy field references
//!
//! Every non-trivial decision carries the list of policy fields it
//! compared against, so an audit reader can reproduce the arithmetic.
//! [`PolicyField`] is that reference vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// A named field of the per-target policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyField {
    /// `scaling.min_replicas`
    MinReplicas,
    /// `scaling.max_replicas`
    MaxReplicas,
    /// `scaling.scale_up_threshold`
    ScaleUpThreshold,
    /// `scaling.scale_down_threshold`
    ScaleDownThreshold,
    /// `scaling.weights`
    MetricWeights,
    /// `scaling.cooldown_secs`
    CooldownSecs,
    /// `resources.cpu_target_utilization`
    CpuTargetUtilization,
    /// `resources.memory_target_utilization`
    MemoryTargetUtilization,
    /// `resources.optimization_threshold`
    OptimizationThreshold,
    /// `recovery.max_restart_count`
    MaxRestartCount,
    /// `recovery.rollback_threshold`
    RollbackThreshold,
    /// `recovery.rollback_on_failure`
    RollbackOnFailure,
    /// `breaker.failure_threshold`
    FailureThreshold,
    /// `breaker.failure_window_secs`
    FailureWindowSecs,
    /// `breaker.reset_timeout_secs`
    ResetTimeoutSecs,
    /// `governance.forbidden_actions`
    ForbiddenActions,
    /// `governance.restricted_actions`
    RestrictedActions,
    /// `governance.max_scale_step`
    MaxScaleStep,
    /// `governance.max_resource_delta`
    MaxResourceDelta,
    /// `governance.max_operations_per_hour`
    MaxOperationsPerHour,
    /// `governance.approval_timeout_secs`
    ApprovalTimeoutSecs,
    /// `governance.approver_channel`
    ApproverChannel,
    /// `verification.latency_target_ms`
    LatencyTargetMs,
    /// `verification.max_error_rate`
    MaxErrorRate,
    /// `verification.min_availability`
    MinAvailability,
    /// `verification.stabilization_secs`
    StabilizationSecs,
}

impl PolicyField {
    /// Stable snake_case name for rationale strings and audit records
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinReplicas => "min_replicas",
            Self::MaxReplicas => "max_replicas",
            Self::ScaleUpThreshold => "scale_up_threshold",
            Self::ScaleDownThreshold => "scale_down_threshold",
            Self::MetricWeights => "metric_weights",
            Self::CooldownSecs => "cooldown_secs",
            Self::CpuTargetUtilization => "cpu_target_utilization",
            Self::MemoryTargetUtilization => "memory_target_utilization",
            Self::OptimizationThreshold => "optimization_threshold",
            Self::MaxRestartCount => "max_restart_count",
            Self::RollbackThreshold => "rollback_threshold",
            Self::RollbackOnFailure => "rollback_on_failure",
            Self::FailureThreshold => "failure_threshold",
            Self::FailureWindowSecs => "failure_window_secs",
            Self::ResetTimeoutSecs => "reset_timeout_secs",
            Self::ForbiddenActions => "forbidden_actions",
            Self::RestrictedActions => "restricted_actions",
            Self::MaxScaleStep => "max_scale_step",
            Self::MaxResourceDelta => "max_resource_delta",
            Self::MaxOperationsPerHour => "max_operations_per_hour",
            Self::ApprovalTimeoutSecs => "approval_timeout_secs",
            Self::ApproverChannel => "approver_channel",
            Self::LatencyTargetMs => "latency_target_ms",
            Self::MaxErrorRate => "max_error_rate",
            Self::MinAvailability => "min_availability",
            Self::StabilizationSecs => "stabilization_secs",
        }
    }
}

impl Display for PolicyField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
