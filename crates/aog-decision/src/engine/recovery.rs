//! Failure recovery rule
//!
//! Runs when the snapshot shows instance distress. The ladder is
//! ordered by severity of the response: escalate past the restart cap,
//! roll back past the rollback threshold, otherwise restart.

use crate::action::DecisionAction;
use crate::decision::Decision;
use aog_metrics::MetricSnapshot;
use aog_policy::{ActionKind, Policy, PolicyField};
use chrono::{DateTime, Utc};

/// Pick a recovery response for a distressed instance
pub(crate) fn evaluate(snapshot: &MetricSnapshot, policy: &Policy, now: DateTime<Utc>) -> Decision {
    let recovery = &policy.recovery;
    let target = snapshot.target.clone();

    match snapshot.restart_count {
        Some(restarts) if restarts >= recovery.max_restart_count => Decision::new(
            target,
            DecisionAction::EscalateToApproval {
                recommended: ActionKind::RollbackDeployment,
            },
            format!(
                "restart count {restarts} at or above max_restart_count {}; \
                 recommending rollback_deployment for human review",
                recovery.max_restart_count,
            ),
            vec![PolicyField::MaxRestartCount],
            now,
        )
        .with_approval_required(),
        Some(restarts) if restarts >= recovery.rollback_threshold && recovery.rollback_on_failure => {
            Decision::new(
                target,
                DecisionAction::TriggerRollback,
                format!(
                    "restart count {restarts} at or above rollback_threshold {} \
                     with rollback_on_failure enabled; rolling back to previous revision",
                    recovery.rollback_threshold,
                ),
                vec![PolicyField::RollbackThreshold, PolicyField::RollbackOnFailure],
                now,
            )
        }
        Some(restarts) if restarts >= recovery.rollback_threshold => Decision::new(
            target,
            DecisionAction::RestartPod,
            format!(
                "restart count {restarts} at or above rollback_threshold {} \
                 but rollback_on_failure disabled; restarting pod",
                recovery.rollback_threshold,
            ),
            vec![PolicyField::RollbackThreshold, PolicyField::RollbackOnFailure],
            now,
        ),
        Some(restarts) => Decision::new(
            target,
            DecisionAction::RestartPod,
            format!(
                "restart count {restarts} below rollback_threshold {}; restarting pod",
                recovery.rollback_threshold,
            ),
            vec![PolicyField::MaxRestartCount, PolicyField::RollbackThreshold],
            now,
        ),
        None => Decision::new(
            target,
            DecisionAction::RestartPod,
            "health check failing with restart count unavailable; restarting pod".to_string(),
            vec![PolicyField::MaxRestartCount, PolicyField::RollbackThreshold],
            now,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aog_policy::TargetId;

    fn distressed(restarts: u32) -> MetricSnapshot {
        MetricSnapshot::new(TargetId::new("worker")).with_restart_count(restarts)
    }

    #[test]
    fn restart_cap_escalates_with_rollback_recommendation() {
        let decision = evaluate(&distressed(5), &Policy::default(), Utc::now());
        assert!(matches!(
            decision.action,
            DecisionAction::EscalateToApproval {
                recommended: ActionKind::RollbackDeployment
            }
        ));
        assert!(decision.requires_approval);
        assert!(decision.rationale.contains("max_restart_count 5"));
    }

    #[test]
    fn rollback_threshold_triggers_rollback() {
        let decision = evaluate(&distressed(3), &Policy::default(), Utc::now());
        assert!(matches!(decision.action, DecisionAction::TriggerRollback));
        assert!(decision.rationale.contains("rollback_threshold 3"));
    }

    #[test]
    fn rollback_disabled_falls_back_to_restart() {
        let mut policy = Policy::default();
        policy.recovery.rollback_on_failure = false;
        let decision = evaluate(&distressed(4), &policy, Utc::now());
        assert!(matches!(decision.action, DecisionAction::RestartPod));
        assert!(decision.rationale.contains("rollback_on_failure disabled"));
    }

    #[test]
    fn low_restart_count_restarts_pod() {
        let decision = evaluate(&distressed(1), &Policy::default(), Utc::now());
        assert!(matches!(decision.action, DecisionAction::RestartPod));
        assert!(!decision.requires_approval);
    }

    #[test]
    fn failing_health_without_restart_count_restarts_pod() {
        let snapshot =
            MetricSnapshot::new(TargetId::new("worker")).with_all_pods_healthy(false);
        let decision = evaluate(&snapshot, &Policy::default(), Utc::now());
        assert!(matches!(decision.action, DecisionAction::RestartPod));
        assert!(decision.rationale.contains("restart count unavailable"));
    }
}
