//! Action vocabulary
//!
//! [`ActionKind`] is the closed set of operation kinds the governance
//! tiers classify. The decision engine emits a parameterized action type
//! built over this vocabulary; policies reference kinds directly in their
//! forbidden and restricted lists.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of operation against a target
///
/// Includes destructive kinds (e.g. [`ActionKind::DeleteDeployment`]) that
/// the decision engine never proposes but that governance must still be able
/// to classify when an operation is submitted from outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Increase the replica count
    ScaleUp,
    /// Decrease the replica count
    ScaleDown,
    /// Adjust resource requests toward target utilization
    OptimizeResources,
    /// Restart a failing instance
    RestartPod,
    /// Roll the deployment back to its previous revision, engine-initiated
    TriggerRollback,
    /// Roll the deployment back to its previous revision, human-initiated
    RollbackDeployment,
    /// Hand the situation to a human approver
    EscalateToApproval,
    /// Delete the deployment entirely (destructive; never engine-proposed)
    DeleteDeployment,
    /// Do nothing this cycle
    NoAction,
}

impl ActionKind {
    /// Stable snake_case name, used in policy lists and audit records
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScaleUp => "scale_up",
            Self::ScaleDown => "scale_down",
            Self::OptimizeResources => "optimize_resources",
            Self::RestartPod => "restart_pod",
            Self::TriggerRollback => "trigger_rollback",
            Self::RollbackDeployment => "rollback_deployment",
            Self::EscalateToApproval => "escalate_to_approval",
            Self::DeleteDeployment => "delete_deployment",
            Self::NoAction => "no_action",
        }
    }

    /// Whether this kind mutates target state when executed
    ///
    /// Non-mutating kinds bypass execution entirely: there is nothing to
    /// run, verify, or roll back.
    #[inline]
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::EscalateToApproval | Self::NoAction)
    }

    /// Safer kinds worth suggesting when this kind is forbidden by policy
    #[must_use]
    pub fn suggested_alternatives(&self) -> &'static [ActionKind] {
        match self {
            Self::DeleteDeployment => &[Self::ScaleDown, Self::EscalateToApproval],
            Self::TriggerRollback | Self::RollbackDeployment => &[Self::EscalateToApproval],
            Self::ScaleUp | Self::ScaleDown => &[Self::OptimizeResources, Self::EscalateToApproval],
            Self::OptimizeResources | Self::RestartPod => &[Self::EscalateToApproval],
            Self::EscalateToApproval | Self::NoAction => &[],
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
