//! Decision actions
//!
//! [`DecisionAction`] is the closed sum type over the operation
//! vocabulary: every variant carries exactly the parameters its kind
//! needs and nothing else. The rollback planner matches on this type
//! exhaustively, so adding a variant forces the inverse mapping to be
//! revisited at compile time.

use aog_policy::ActionKind;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Which resource a recommendation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// CPU request, millicores
    Cpu,
    /// Memory request, MiB
    Memory,
}

impl ResourceKind {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
        }
    }

    /// Unit suffix for rationale strings
    #[inline]
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Cpu => "m",
            Self::Memory => "MiB",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One resource-request adjustment proposed by the optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecommendation {
    /// Resource being adjusted
    pub resource: ResourceKind,
    /// Request currently configured
    pub current_request: f64,
    /// Request that would bring utilization to target
    pub target_request: f64,
    /// Observed usage/request ratio
    pub current_utilization: f64,
    /// Relative request change, `|target - current| / current`
    pub difference: f64,
}

/// Why the engine proposed nothing this cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoActionReason {
    /// Cooldown since the last attempted operation has not elapsed
    CooldownPeriodNotElapsed,
    /// Utilization wants a scale-up but replicas are at the policy maximum
    AtMaxReplicas,
    /// Utilization wants a scale-down but replicas are at the policy minimum
    AtMinReplicas,
    /// Required readings were absent or non-finite
    MetricsUnavailable,
    /// Everything is inside the configured thresholds
    WithinThresholds,
}

impl NoActionReason {
    /// Stable snake_case name for rationale and audit records
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CooldownPeriodNotElapsed => "cooldown_period_not_elapsed",
            Self::AtMaxReplicas => "at_max_replicas",
            Self::AtMinReplicas => "at_min_replicas",
            Self::MetricsUnavailable => "metrics_unavailable",
            Self::WithinThresholds => "within_thresholds",
        }
    }
}

impl Display for NoActionReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A proposed operation, parameters included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DecisionAction {
    /// Add one replica (clamped into policy bounds)
    ScaleUp {
        /// Replica count observed in the snapshot
        from_replicas: u32,
        /// Proposed replica count
        to_replicas: u32,
    },
    /// Remove one replica (clamped into policy bounds)
    ScaleDown {
        /// Replica count observed in the snapshot
        from_replicas: u32,
        /// Proposed replica count
        to_replicas: u32,
    },
    /// Adjust resource requests toward target utilization
    OptimizeResources {
        /// Per-resource adjustments, one entry per resource over threshold
        recommendations: Vec<ResourceRecommendation>,
    },
    /// Restart the failing instance
    RestartPod,
    /// Roll the deployment back to its previous revision
    TriggerRollback,
    /// Roll the deployment back to its previous revision, operator-submitted
    RollbackDeployment,
    /// Hand the situation to a human approver
    EscalateToApproval {
        /// The follow-up the approver is advised to take
        recommended: ActionKind,
    },
    /// Delete the deployment; never engine-proposed, classified only
    DeleteDeployment,
    /// Nothing to do this cycle
    NoAction {
        /// Why nothing was proposed
        reason: NoActionReason,
    },
}

impl DecisionAction {
    /// The governance classification kind of this action
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::ScaleUp { .. } => ActionKind::ScaleUp,
            Self::ScaleDown { .. } => ActionKind::ScaleDown,
            Self::OptimizeResources { .. } => ActionKind::OptimizeResources,
            Self::RestartPod => ActionKind::RestartPod,
            Self::TriggerRollback => ActionKind::TriggerRollback,
            Self::RollbackDeployment => ActionKind::RollbackDeployment,
            Self::EscalateToApproval { .. } => ActionKind::EscalateToApproval,
            Self::DeleteDeployment => ActionKind::DeleteDeployment,
            Self::NoAction { .. } => ActionKind::NoAction,
        }
    }

    /// Replica delta for scale actions, zero otherwise
    #[must_use]
    pub fn scale_delta(&self) -> u32 {
        match self {
            Self::ScaleUp {
                from_replicas,
                to_replicas,
            }
            | Self::ScaleDown {
                from_replicas,
                to_replicas,
            } => to_replicas.abs_diff(*from_replicas),
            _ => 0,
        }
    }

    /// Largest relative resource change proposed, zero when not optimizing
    #[must_use]
    pub fn max_resource_difference(&self) -> f64 {
        match self {
            Self::OptimizeResources { recommendations } => recommendations
                .iter()
                .map(|r| r.difference)
                .fold(0.0, f64::max),
            _ => 0.0,
        }
    }
}

impl Display for DecisionAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mapping_is_total() {
        let actions = [
            DecisionAction::ScaleUp {
                from_replicas: 2,
                to_replicas: 3,
            },
            DecisionAction::ScaleDown {
                from_replicas: 3,
                to_replicas: 2,
            },
            DecisionAction::OptimizeResources {
                recommendations: vec![],
            },
            DecisionAction::RestartPod,
            DecisionAction::TriggerRollback,
            DecisionAction::RollbackDeployment,
            DecisionAction::EscalateToApproval {
                recommended: ActionKind::RollbackDeployment,
            },
            DecisionAction::DeleteDeployment,
            DecisionAction::NoAction {
                reason: NoActionReason::WithinThresholds,
            },
        ];
        let kinds: Vec<_> = actions.iter().map(DecisionAction::kind).collect();
        assert_eq!(kinds.len(), 9);
        assert_eq!(kinds[0], ActionKind::ScaleUp);
        assert_eq!(kinds[8], ActionKind::NoAction);
    }

    #[test]
    fn scale_delta_for_scale_actions_only() {
        let up = DecisionAction::ScaleUp {
            from_replicas: 2,
            to_replicas: 5,
        };
        assert_eq!(up.scale_delta(), 3);
        assert_eq!(DecisionAction::RestartPod.scale_delta(), 0);
    }

    #[test]
    fn max_resource_difference_picks_largest() {
        let action = DecisionAction::OptimizeResources {
            recommendations: vec![
                ResourceRecommendation {
                    resource: ResourceKind::Cpu,
                    current_request: 500.0,
                    target_request: 230.0,
                    current_utilization: 0.30,
                    difference: 0.54,
                },
                ResourceRecommendation {
                    resource: ResourceKind::Memory,
                    current_request: 512.0,
                    target_request: 460.0,
                    current_utilization: 0.67,
                    difference: 0.10,
                },
            ],
        };
        assert!((action.max_resource_difference() - 0.54).abs() < 1e-12);
    }

    #[test]
    fn action_serde_tag_is_snake_case() {
        let action = DecisionAction::ScaleUp {
            from_replicas: 2,
            to_replicas: 3,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"action\":\"scale_up\""));
        assert!(json.contains("\"to_replicas\":3"));

        let no_action = DecisionAction::NoAction {
            reason: NoActionReason::AtMinReplicas,
        };
        let json = serde_json::to_string(&no_action).unwrap();
        assert!(json.contains("\"reason\":\"at_min_replicas\""));
    }
}
