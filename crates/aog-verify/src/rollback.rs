//! Rollback planning
//!
//! Every executable action maps to exactly one inverse, derived from
//! the state the gateway captured before mutating. The mapping is a
//! fixed exhaustive table, never inferred from metrics: a rollback must
//! be computable even when the pipeline that triggered it is degraded.

use crate::result::VerificationResult;
use aog_decision::{DecisionAction, PriorState, ResourceKind, RollbackOp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The inverse, or why there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum InversePlan {
    /// A concrete inverse the gateway can apply
    Invert {
        /// The operation to apply
        op: RollbackOp,
    },
    /// No inverse exists; a failed verification escalates instead
    NoInverse {
        /// Why nothing can be applied
        reason: String,
    },
    /// The action never executes, so the question does not arise
    NotApplicable,
}

impl InversePlan {
    fn no_inverse(reason: impl Into<String>) -> Self {
        Self::NoInverse {
            reason: reason.into(),
        }
    }
}

/// Derive the inverse of an executed action
///
/// Prefers the gateway-captured prior state; falls back to the
/// decision's own parameters where the action carries them. A rollback
/// action has no inverse: undoing an undo would cascade, and the rule
/// is one corrective attempt per operation.
#[must_use]
pub fn plan_rollback(action: &DecisionAction, prior: &PriorState) -> InversePlan {
    match action {
        DecisionAction::ScaleUp { from_replicas, .. }
        | DecisionAction::ScaleDown { from_replicas, .. } => InversePlan::Invert {
            op: RollbackOp::RestoreReplicas {
                replicas: prior.replicas.unwrap_or(*from_replicas),
            },
        },
        DecisionAction::OptimizeResources { recommendations } => {
            let fallback = |kind: ResourceKind| {
                recommendations
                    .iter()
                    .find(|r| r.resource == kind)
                    .map(|r| r.current_request)
            };
            let cpu = prior
                .cpu_request_millis
                .or_else(|| fallback(ResourceKind::Cpu));
            let memory = prior
                .memory_request_mib
                .or_else(|| fallback(ResourceKind::Memory));
            if cpu.is_none() && memory.is_none() {
                InversePlan::no_inverse("no prior resource requests captured")
            } else {
                InversePlan::Invert {
                    op: RollbackOp::RestoreResources {
                        cpu_request_millis: cpu,
                        memory_request_mib: memory,
                    },
                }
            }
        }
        DecisionAction::RestartPod => match &prior.revision {
            Some(revision) => InversePlan::Invert {
                op: RollbackOp::RevertToRevision {
                    revision: revision.clone(),
                },
            },
            None => InversePlan::no_inverse("no prior revision captured"),
        },
        DecisionAction::TriggerRollback | DecisionAction::RollbackDeployment => {
            InversePlan::no_inverse("a rollback has no inverse; failures escalate")
        }
        DecisionAction::EscalateToApproval { .. }
        | DecisionAction::DeleteDeployment
        | DecisionAction::NoAction { .. } => InversePlan::NotApplicable,
    }
}

/// Durable account of one rollback attempt
///
/// Written whether or not the inverse was applied; the audit trail must
/// show what was attempted and how long the system spent degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackRecord {
    /// Inverse operation that was dispatched
    pub op: RollbackOp,
    /// Whether the gateway applied it
    pub succeeded: bool,
    /// Gateway failure description when it did not
    pub failure_reason: Option<String>,
    /// When the rollback was dispatched
    pub started_at: DateTime<Utc>,
    /// Milliseconds from dispatch to gateway completion
    pub duration_ms: u64,
    /// Post-rollback verification, taken only after a successful apply
    pub final_state: Option<VerificationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use aog_decision::ResourceRecommendation;
    use pretty_assertions::assert_eq;

    fn prior() -> PriorState {
        PriorState {
            replicas: Some(2),
            cpu_request_millis: Some(500.0),
            memory_request_mib: Some(512.0),
            revision: Some("web-7d4b9c".to_string()),
        }
    }

    #[test]
    fn scale_up_inverts_to_prior_replicas() {
        let action = DecisionAction::ScaleUp {
            from_replicas: 2,
            to_replicas: 3,
        };
        let plan = plan_rollback(&action, &prior());
        assert_eq!(
            plan,
            InversePlan::Invert {
                op: RollbackOp::RestoreReplicas { replicas: 2 }
            }
        );
    }

    #[test]
    fn scale_down_without_captured_prior_falls_back_to_decision() {
        let action = DecisionAction::ScaleDown {
            from_replicas: 4,
            to_replicas: 3,
        };
        let plan = plan_rollback(&action, &PriorState::default());
        assert_eq!(
            plan,
            InversePlan::Invert {
                op: RollbackOp::RestoreReplicas { replicas: 4 }
            }
        );
    }

    #[test]
    fn optimize_resources_restores_prior_requests() {
        let action = DecisionAction::OptimizeResources {
            recommendations: vec![ResourceRecommendation {
                resource: ResourceKind::Cpu,
                current_request: 500.0,
                target_request: 350.0,
                current_utilization: 0.45,
                difference: 0.30,
            }],
        };
        let plan = plan_rollback(&action, &prior());
        match plan {
            InversePlan::Invert {
                op:
                    RollbackOp::RestoreResources {
                        cpu_request_millis,
                        memory_request_mib,
                    },
            } => {
                assert_eq!(cpu_request_millis, Some(500.0));
                assert_eq!(memory_request_mib, Some(512.0));
            }
            other => panic!("expected restore_resources, got {other:?}"),
        }
    }

    #[test]
    fn optimize_resources_falls_back_to_recommendation_currents() {
        let action = DecisionAction::OptimizeResources {
            recommendations: vec![ResourceRecommendation {
                resource: ResourceKind::Memory,
                current_request: 1024.0,
                target_request: 768.0,
                current_utilization: 0.5,
                difference: 0.25,
            }],
        };
        let plan = plan_rollback(&action, &PriorState::default());
        match plan {
            InversePlan::Invert {
                op:
                    RollbackOp::RestoreResources {
                        cpu_request_millis,
                        memory_request_mib,
                    },
            } => {
                assert_eq!(cpu_request_millis, None);
                assert_eq!(memory_request_mib, Some(1024.0));
            }
            other => panic!("expected restore_resources, got {other:?}"),
        }
    }

    #[test]
    fn optimize_with_nothing_to_restore_has_no_inverse() {
        let action = DecisionAction::OptimizeResources {
            recommendations: Vec::new(),
        };
        assert!(matches!(
            plan_rollback(&action, &PriorState::default()),
            InversePlan::NoInverse { .. }
        ));
    }

    #[test]
    fn restart_pod_reverts_to_prior_revision() {
        let plan = plan_rollback(&DecisionAction::RestartPod, &prior());
        assert_eq!(
            plan,
            InversePlan::Invert {
                op: RollbackOp::RevertToRevision {
                    revision: "web-7d4b9c".to_string()
                }
            }
        );
    }

    #[test]
    fn restart_pod_without_revision_has_no_inverse() {
        assert!(matches!(
            plan_rollback(&DecisionAction::RestartPod, &PriorState::default()),
            InversePlan::NoInverse { .. }
        ));
    }

    #[test]
    fn rollbacks_never_cascade() {
        assert!(matches!(
            plan_rollback(&DecisionAction::TriggerRollback, &prior()),
            InversePlan::NoInverse { .. }
        ));
        assert!(matches!(
            plan_rollback(&DecisionAction::RollbackDeployment, &prior()),
            InversePlan::NoInverse { .. }
        ));
    }

    #[test]
    fn non_executing_actions_are_not_applicable() {
        use aog_policy::ActionKind;
        use aog_decision::NoActionReason;

        let escalate = DecisionAction::EscalateToApproval {
            recommended: ActionKind::RollbackDeployment,
        };
        assert_eq!(plan_rollback(&escalate, &prior()), InversePlan::NotApplicable);
        assert_eq!(
            plan_rollback(&DecisionAction::DeleteDeployment, &prior()),
            InversePlan::NotApplicable
        );
        let noop = DecisionAction::NoAction {
            reason: NoActionReason::WithinThresholds,
        };
        assert_eq!(plan_rollback(&noop, &prior()), InversePlan::NotApplicable);
    }

    #[test]
    fn plan_serde_tag_is_snake_case() {
        let plan = plan_rollback(&DecisionAction::TriggerRollback, &prior());
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("\"plan\":\"no_inverse\""));
    }
}
