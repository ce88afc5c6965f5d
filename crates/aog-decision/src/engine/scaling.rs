//! Replica scaling rule
//!
//! Scores the snapshot into a single weighted utilization value and
//! proposes a one-step replica change when it leaves the threshold
//! band. Proposals are clamped into the policy's replica bounds.

use crate::action::{DecisionAction, NoActionReason};
use crate::decision::Decision;
use aog_metrics::ScalingReadings;
use aog_policy::{MetricWeights, Policy, PolicyField, TargetId};
use chrono::{DateTime, Utc};

/// Combine the readings into one 0-1 score
///
/// Latency is normalized against the policy latency target and capped
/// at 1.0 before weighting, so a pathological latency sample cannot
/// push the score past the top of the scale on its own.
pub fn weighted_utilization(
    readings: &ScalingReadings,
    weights: &MetricWeights,
    latency_target_ms: f64,
) -> f64 {
    let latency_score = (readings.latency_p95_ms / latency_target_ms).min(1.0);
    readings.cpu_utilization * weights.cpu
        + readings.memory_utilization * weights.memory
        + latency_score * weights.latency
}

/// Propose a scale step, or `None` when utilization sits inside the band
pub(crate) fn evaluate(
    target: &TargetId,
    readings: &ScalingReadings,
    utilization: f64,
    policy: &Policy,
    now: DateTime<Utc>,
) -> Option<Decision> {
    let scaling = &policy.scaling;
    let current = readings.replicas;

    if utilization > scaling.scale_up_threshold {
        if current >= scaling.max_replicas {
            return Some(Decision::new(
                target.clone(),
                DecisionAction::NoAction {
                    reason: NoActionReason::AtMaxReplicas,
                },
                format!(
                    "weighted utilization {utilization:.3} above scale_up_threshold {:.3} \
                     but replicas {current} already at max_replicas {}; consider raising max_replicas",
                    scaling.scale_up_threshold, scaling.max_replicas,
                ),
                vec![PolicyField::ScaleUpThreshold, PolicyField::MaxReplicas],
                now,
            ));
        }
        let to = (current + 1).clamp(scaling.min_replicas, scaling.max_replicas);
        return Some(Decision::new(
            target.clone(),
            DecisionAction::ScaleUp {
                from_replicas: current,
                to_replicas: to,
            },
            rationale(
                readings,
                utilization,
                policy,
                "above scale_up_threshold",
                scaling.scale_up_threshold,
                current,
                to,
            ),
            vec![
                PolicyField::ScaleUpThreshold,
                PolicyField::MetricWeights,
                PolicyField::MaxReplicas,
            ],
            now,
        ));
    }

    if utilization < scaling.scale_down_threshold {
        if current <= scaling.min_replicas {
            return Some(Decision::new(
                target.clone(),
                DecisionAction::NoAction {
                    reason: NoActionReason::AtMinReplicas,
                },
                format!(
                    "weighted utilization {utilization:.3} below scale_down_threshold {:.3} \
                     but replicas {current} already at min_replicas {}; consider lowering min_replicas",
                    scaling.scale_down_threshold, scaling.min_replicas,
                ),
                vec![PolicyField::ScaleDownThreshold, PolicyField::MinReplicas],
                now,
            ));
        }
        let to = current.saturating_sub(1).clamp(scaling.min_replicas, scaling.max_replicas);
        return Some(Decision::new(
            target.clone(),
            DecisionAction::ScaleDown {
                from_replicas: current,
                to_replicas: to,
            },
            rationale(
                readings,
                utilization,
                policy,
                "below scale_down_threshold",
                scaling.scale_down_threshold,
                current,
                to,
            ),
            vec![
                PolicyField::ScaleDownThreshold,
                PolicyField::MetricWeights,
                PolicyField::MinReplicas,
            ],
            now,
        ));
    }

    None
}

fn rationale(
    readings: &ScalingReadings,
    utilization: f64,
    policy: &Policy,
    relation: &str,
    threshold: f64,
    from: u32,
    to: u32,
) -> String {
    let weights = &policy.scaling.weights;
    format!(
        "weighted utilization {utilization:.3} {relation} {threshold:.3} \
         (cpu {:.3}*{:.2} + memory {:.3}*{:.2} + latency {:.1}/{:.1}ms*{:.2}); \
         scaling {from} -> {to} within [{}, {}]",
        readings.cpu_utilization,
        weights.cpu,
        readings.memory_utilization,
        weights.memory,
        readings.latency_p95_ms,
        policy.verification.latency_target_ms,
        weights.latency,
        policy.scaling.min_replicas,
        policy.scaling.max_replicas,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings(cpu: f64, memory: f64, latency: f64, replicas: u32) -> ScalingReadings {
        ScalingReadings {
            cpu_utilization: cpu,
            memory_utilization: memory,
            latency_p95_ms: latency,
            replicas,
        }
    }

    #[test]
    fn weighted_utilization_matches_hand_computation() {
        let weights = MetricWeights::new(0.5, 0.3, 0.2);
        let score = weighted_utilization(&readings(0.85, 0.70, 180.0, 2), &weights, 200.0);
        assert!((score - 0.815).abs() < 1e-9);
    }

    #[test]
    fn latency_score_caps_at_one() {
        let weights = MetricWeights::new(0.0, 0.0, 1.0);
        let score = weighted_utilization(&readings(0.0, 0.0, 900.0, 2), &weights, 200.0);
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn proposal_clamps_into_bounds_from_below() {
        let mut policy = Policy::default();
        policy.scaling.min_replicas = 2;
        policy.scaling.max_replicas = 6;
        let r = readings(0.95, 0.95, 500.0, 0);
        let util = weighted_utilization(&r, &policy.scaling.weights, 500.0);
        let decision =
            evaluate(&TargetId::new("web"), &r, util, &policy, Utc::now()).unwrap();
        match decision.action {
            DecisionAction::ScaleUp { to_replicas, .. } => assert_eq!(to_replicas, 2),
            other => panic!("expected scale_up, got {other:?}"),
        }
    }

    #[test]
    fn proposal_clamps_into_bounds_from_above() {
        let mut policy = Policy::default();
        policy.scaling.max_replicas = 5;
        let r = readings(0.05, 0.05, 10.0, 9);
        let util = weighted_utilization(&r, &policy.scaling.weights, 500.0);
        let decision =
            evaluate(&TargetId::new("web"), &r, util, &policy, Utc::now()).unwrap();
        match decision.action {
            DecisionAction::ScaleDown { to_replicas, .. } => assert_eq!(to_replicas, 5),
            other => panic!("expected scale_down, got {other:?}"),
        }
    }

    #[test]
    fn in_band_utilization_returns_none() {
        let policy = Policy::default();
        let r = readings(0.5, 0.5, 100.0, 3);
        let util = weighted_utilization(&r, &policy.scaling.weights, 500.0);
        assert!(evaluate(&TargetId::new("web"), &r, util, &policy, Utc::now()).is_none());
    }
}
