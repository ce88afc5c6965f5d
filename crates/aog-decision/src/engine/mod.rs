//! The decision engine
//!
//! [`decide`] is a pure function over one snapshot, one policy, and
//! the breaker view at evaluation time. It performs no I/O and
//! mutates nothing; gating (breaker, governance tiers, rate limits)
//! is applied downstream by the enforcer, which is why an open
//! breaker still yields a decision here.
//!
//! Evaluation order:
//! 1. cooldown short-circuit
//! 2. failure recovery, when the snapshot shows distress
//! 3. scaling-readings availability
//! 4. scaling thresholds
//! 5. resource optimization
//! 6. in-range `no_action`

mod recovery;
mod resources;
mod scaling;

pub use resources::APPROVAL_ESCALATION_DELTA;
pub use scaling::weighted_utilization;

use crate::action::{DecisionAction, NoActionReason};
use crate::decision::Decision;
use aog_breaker::BreakerStatus;
use aog_metrics::MetricSnapshot;
use aog_policy::{Policy, PolicyField};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Everything the engine reads when evaluating one target
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// Live readings sampled this cycle
    pub snapshot: &'a MetricSnapshot,
    /// The target's policy, immutable for the duration of the cycle
    pub policy: &'a Policy,
    /// Breaker view at decision time. Carried for the audit record;
    /// the enforcer applies the actual gate.
    pub breaker: &'a BreakerStatus,
    /// Time since the last attempted operation, `None` when none yet
    pub elapsed_since_last_attempt: Option<Duration>,
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

/// Evaluate one target's snapshot into a decision
#[must_use]
pub fn decide(ctx: &DecisionContext<'_>) -> Decision {
    let snapshot = ctx.snapshot;
    let policy = ctx.policy;

    // Cooldown is measured from the last attempted operation, so even
    // a failed execution restarts the clock.
    if let Some(elapsed) = ctx.elapsed_since_last_attempt {
        let cooldown = policy.scaling.cooldown();
        if elapsed < cooldown {
            return Decision::new(
                snapshot.target.clone(),
                DecisionAction::NoAction {
                    reason: NoActionReason::CooldownPeriodNotElapsed,
                },
                format!(
                    "cooldown active: {}s elapsed of {}s since last attempted operation",
                    elapsed.as_secs(),
                    cooldown.as_secs(),
                ),
                vec![PolicyField::CooldownSecs],
                ctx.now,
            );
        }
    }

    // A distressed instance gets a recovery response even when the
    // scaling readings are incomplete.
    if snapshot.is_distressed() {
        return recovery::evaluate(snapshot, policy, ctx.now);
    }

    let Some(readings) = snapshot.scaling_readings() else {
        let missing = snapshot.missing_scaling_fields().join(", ");
        return Decision::new(
            snapshot.target.clone(),
            DecisionAction::NoAction {
                reason: NoActionReason::MetricsUnavailable,
            },
            format!("required readings absent or non-finite: {missing}"),
            vec![],
            ctx.now,
        );
    };

    let utilization = scaling::weighted_utilization(
        &readings,
        &policy.scaling.weights,
        policy.verification.latency_target_ms,
    );
    if let Some(decision) = scaling::evaluate(&snapshot.target, &readings, utilization, policy, ctx.now)
    {
        return decision;
    }
    if let Some(decision) = resources::evaluate(snapshot, policy, ctx.now) {
        return decision;
    }

    Decision::new(
        snapshot.target.clone(),
        DecisionAction::NoAction {
            reason: NoActionReason::WithinThresholds,
        },
        format!(
            "weighted utilization {utilization:.3} within [{:.3}, {:.3}] and \
             resource requests within optimization_threshold {:.3}",
            policy.scaling.scale_down_threshold,
            policy.scaling.scale_up_threshold,
            policy.resources.optimization_threshold,
        ),
        vec![PolicyField::ScaleUpThreshold, PolicyField::ScaleDownThreshold],
        ctx.now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aog_breaker::BreakerState;
    use aog_policy::{ScalingPolicy, TargetId, VerificationPolicy};
    use pretty_assertions::assert_eq;

    fn closed_breaker() -> BreakerStatus {
        BreakerStatus {
            state: BreakerState::Closed,
            recent_failures: 0,
            opened_at: None,
        }
    }

    /// Policy used by the worked scaling examples: bounds [1, 5],
    /// thresholds 0.30/0.80, latency target 200ms.
    fn scenario_policy() -> Policy {
        Policy::new()
            .with_scaling(ScalingPolicy {
                min_replicas: 1,
                max_replicas: 5,
                ..ScalingPolicy::default()
            })
            .with_verification(VerificationPolicy {
                latency_target_ms: 200.0,
                ..VerificationPolicy::default()
            })
    }

    fn decide_with(snapshot: &MetricSnapshot, policy: &Policy) -> Decision {
        let breaker = closed_breaker();
        decide(&DecisionContext {
            snapshot,
            policy,
            breaker: &breaker,
            elapsed_since_last_attempt: None,
            now: Utc::now(),
        })
    }

    #[test]
    fn hot_target_scales_up_one_step() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.85)
            .with_memory_utilization(0.70)
            .with_latency_p95_ms(180.0)
            .with_replicas(2);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert_eq!(
            decision.action,
            DecisionAction::ScaleUp {
                from_replicas: 2,
                to_replicas: 3,
            }
        );
        assert!(decision.rationale.contains("0.815"));
        assert!(decision.rationale.contains("scale_up_threshold 0.800"));
        assert!(!decision.requires_approval);
    }

    #[test]
    fn cold_target_at_floor_reports_at_min_replicas() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.1)
            .with_memory_utilization(0.1)
            .with_latency_p95_ms(50.0)
            .with_replicas(1);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert_eq!(
            decision.action,
            DecisionAction::NoAction {
                reason: NoActionReason::AtMinReplicas,
            }
        );
        assert!(decision.rationale.contains("min_replicas 1"));
    }

    #[test]
    fn hot_target_at_ceiling_reports_at_max_replicas() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.95)
            .with_memory_utilization(0.90)
            .with_latency_p95_ms(250.0)
            .with_replicas(5);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert_eq!(
            decision.action,
            DecisionAction::NoAction {
                reason: NoActionReason::AtMaxReplicas,
            }
        );
        assert!(decision.rationale.contains("consider raising max_replicas"));
    }

    #[test]
    fn cooldown_short_circuits_before_thresholds() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.95)
            .with_memory_utilization(0.90)
            .with_latency_p95_ms(400.0)
            .with_replicas(2);
        let policy = scenario_policy();
        let breaker = closed_breaker();
        let decision = decide(&DecisionContext {
            snapshot: &snapshot,
            policy: &policy,
            breaker: &breaker,
            elapsed_since_last_attempt: Some(Duration::from_secs(120)),
            now: Utc::now(),
        });
        assert_eq!(
            decision.action,
            DecisionAction::NoAction {
                reason: NoActionReason::CooldownPeriodNotElapsed,
            }
        );
        assert!(decision.rationale.contains("120s elapsed of 300s"));
    }

    #[test]
    fn elapsed_cooldown_proceeds_to_evaluation() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.85)
            .with_memory_utilization(0.70)
            .with_latency_p95_ms(180.0)
            .with_replicas(2);
        let policy = scenario_policy();
        let breaker = closed_breaker();
        let decision = decide(&DecisionContext {
            snapshot: &snapshot,
            policy: &policy,
            breaker: &breaker,
            elapsed_since_last_attempt: Some(Duration::from_secs(300)),
            now: Utc::now(),
        });
        assert!(matches!(decision.action, DecisionAction::ScaleUp { .. }));
    }

    #[test]
    fn missing_readings_degrade_to_metrics_unavailable() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.85)
            .with_replicas(2);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert_eq!(
            decision.action,
            DecisionAction::NoAction {
                reason: NoActionReason::MetricsUnavailable,
            }
        );
        assert!(decision.rationale.contains("memory_utilization"));
        assert!(decision.rationale.contains("latency_p95_ms"));
    }

    #[test]
    fn distress_takes_priority_over_missing_readings() {
        // No scaling readings at all, but the restart count alone is
        // enough to choose a recovery response.
        let snapshot =
            MetricSnapshot::new(TargetId::new("payments-api")).with_restart_count(3);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert!(matches!(decision.action, DecisionAction::TriggerRollback));
    }

    #[test]
    fn in_band_utilization_falls_through_to_optimization() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.30)
            .with_memory_utilization(0.50)
            .with_latency_p95_ms(100.0)
            .with_replicas(3)
            .with_cpu_millis(150.0, 500.0);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert!(matches!(
            decision.action,
            DecisionAction::OptimizeResources { .. }
        ));
    }

    #[test]
    fn quiet_target_reports_within_thresholds() {
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.50)
            .with_memory_utilization(0.50)
            .with_latency_p95_ms(100.0)
            .with_replicas(3);
        let decision = decide_with(&snapshot, &scenario_policy());
        assert_eq!(
            decision.action,
            DecisionAction::NoAction {
                reason: NoActionReason::WithinThresholds,
            }
        );
        assert!(decision.is_no_action());
    }

    #[test]
    fn open_breaker_does_not_change_the_proposal() {
        // Gating is the enforcer's job; the engine still reports what
        // it would do.
        let snapshot = MetricSnapshot::new(TargetId::new("payments-api"))
            .with_cpu_utilization(0.85)
            .with_memory_utilization(0.70)
            .with_latency_p95_ms(180.0)
            .with_replicas(2);
        let policy = scenario_policy();
        let breaker = BreakerStatus {
            state: BreakerState::Open,
            recent_failures: 3,
            opened_at: Some(Utc::now()),
        };
        let decision = decide(&DecisionContext {
            snapshot: &snapshot,
            policy: &policy,
            breaker: &breaker,
            elapsed_since_last_attempt: None,
            now: Utc::now(),
        });
        assert!(matches!(decision.action, DecisionAction::ScaleUp { .. }));
    }
}
