//! Resource request optimization rule
//!
//! For each of CPU and memory, compares the observed usage/request
//! ratio against the policy's target utilization and recommends a new
//! request when the relative change clears the optimization threshold.
//! A resource with absent readings is skipped, never guessed at.

use crate::action::{DecisionAction, ResourceKind, ResourceRecommendation};
use crate::decision::Decision;
use aog_metrics::{MetricSnapshot, ResourceReadings};
use aog_policy::{Policy, PolicyField};
use chrono::{DateTime, Utc};

/// Relative request change above which an optimization asks for human
/// sign-off. A fixed guard value, independent of the per-target
/// optimization threshold.
pub const APPROVAL_ESCALATION_DELTA: f64 = 0.10;

/// Propose request adjustments, or `None` when every resource is
/// within threshold or unreadable
pub(crate) fn evaluate(
    snapshot: &MetricSnapshot,
    policy: &Policy,
    now: DateTime<Utc>,
) -> Option<Decision> {
    let resources = &policy.resources;
    let mut recommendations = Vec::new();
    let mut notes = Vec::new();
    let mut refs = vec![PolicyField::OptimizationThreshold];

    let candidates = [
        (
            ResourceKind::Cpu,
            snapshot.cpu_readings(),
            resources.cpu_target_utilization,
            PolicyField::CpuTargetUtilization,
        ),
        (
            ResourceKind::Memory,
            snapshot.memory_readings(),
            resources.memory_target_utilization,
            PolicyField::MemoryTargetUtilization,
        ),
    ];

    for (kind, readings, target_utilization, field) in candidates {
        let Some(readings) = readings else { continue };
        let Some(rec) = recommend(kind, readings, target_utilization, resources.optimization_threshold)
        else {
            continue;
        };
        notes.push(format!(
            "{kind} request {:.0}{unit} -> {:.0}{unit} (utilization {:.3} vs target {:.3}, \
             difference {:.3} above optimization_threshold {:.3})",
            rec.current_request,
            rec.target_request,
            rec.current_utilization,
            target_utilization,
            rec.difference,
            resources.optimization_threshold,
            unit = kind.unit(),
        ));
        refs.push(field);
        recommendations.push(rec);
    }

    if recommendations.is_empty() {
        return None;
    }

    let needs_approval = recommendations
        .iter()
        .any(|rec| rec.difference > APPROVAL_ESCALATION_DELTA);
    let mut rationale = notes.join("; ");
    if needs_approval {
        rationale.push_str("; relative change exceeds the 0.10 approval boundary");
    }

    let decision = Decision::new(
        snapshot.target.clone(),
        DecisionAction::OptimizeResources { recommendations },
        rationale,
        refs,
        now,
    );
    Some(if needs_approval {
        decision.with_approval_required()
    } else {
        decision
    })
}

fn recommend(
    resource: ResourceKind,
    readings: ResourceReadings,
    target_utilization: f64,
    threshold: f64,
) -> Option<ResourceRecommendation> {
    let current_utilization = readings.utilization();
    let target_request = readings.usage / target_utilization;
    let difference = (target_request - readings.request).abs() / readings.request;
    (difference > threshold).then(|| ResourceRecommendation {
        resource,
        current_request: readings.request,
        target_request,
        current_utilization,
        difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aog_policy::TargetId;

    fn snapshot() -> MetricSnapshot {
        MetricSnapshot::new(TargetId::new("web"))
    }

    #[test]
    fn overprovisioned_cpu_gets_recommendation() {
        // usage 150m of 500m at target 0.65 -> target request ~230.8m,
        // difference ~0.538.
        let snap = snapshot().with_cpu_millis(150.0, 500.0);
        let decision = evaluate(&snap, &Policy::default(), Utc::now()).unwrap();
        let DecisionAction::OptimizeResources { recommendations } = &decision.action else {
            panic!("expected optimize_resources, got {:?}", decision.action);
        };
        assert_eq!(recommendations.len(), 1);
        let rec = &recommendations[0];
        assert_eq!(rec.resource, ResourceKind::Cpu);
        assert!((rec.target_request - 150.0 / 0.65).abs() < 1e-9);
        assert!(rec.difference > 0.5);
        assert!(decision.requires_approval);
        assert!(decision.rationale.contains("optimization_threshold"));
    }

    #[test]
    fn small_difference_stays_quiet() {
        // usage 330m of 500m -> utilization 0.66, target request ~507.7m,
        // difference ~0.015, under the 0.15 default threshold.
        let snap = snapshot().with_cpu_millis(330.0, 500.0);
        assert!(evaluate(&snap, &Policy::default(), Utc::now()).is_none());
    }

    #[test]
    fn difference_between_threshold_and_guard_skips_approval() {
        let mut policy = Policy::default();
        policy.resources.optimization_threshold = 0.05;
        // usage 300m of 500m -> target request ~461.5m, difference ~0.077:
        // above the loosened threshold, below the 0.10 approval guard.
        let snap = snapshot().with_cpu_millis(300.0, 500.0);
        let decision = evaluate(&snap, &policy, Utc::now()).unwrap();
        assert!(!decision.requires_approval);
    }

    #[test]
    fn absent_resource_is_skipped_not_failed() {
        let snap = snapshot().with_memory_mib(100.0, 512.0);
        let decision = evaluate(&snap, &Policy::default(), Utc::now()).unwrap();
        let DecisionAction::OptimizeResources { recommendations } = &decision.action else {
            panic!("expected optimize_resources");
        };
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0].resource, ResourceKind::Memory);
    }

    #[test]
    fn both_resources_can_recommend_together() {
        let snap = snapshot()
            .with_cpu_millis(150.0, 500.0)
            .with_memory_mib(100.0, 512.0);
        let decision = evaluate(&snap, &Policy::default(), Utc::now()).unwrap();
        let DecisionAction::OptimizeResources { recommendations } = &decision.action else {
            panic!("expected optimize_resources");
        };
        assert_eq!(recommendations.len(), 2);
        assert!(decision.policy_refs.contains(&PolicyField::CpuTargetUtilization));
        assert!(decision.policy_refs.contains(&PolicyField::MemoryTargetUtilization));
    }
}
