//! Cycle outcomes
//!
//! Every run of the control loop for one target ends in exactly one of
//! these. Outcomes are facts, not errors: a blocked verdict or a failed
//! verification is the loop doing its job, and all of them land in the
//! audit trail the same way.

use crate::error::Escalation;
use aog_decision::NoActionReason;
use aog_governance::ApprovalId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How one cycle for one target ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The engine proposed nothing
    NoAction {
        /// Why nothing was proposed
        reason: NoActionReason,
    },
    /// Governance forbade the decision; nothing executed
    Blocked {
        /// The verdict's reason
        reason: String,
    },
    /// Governance restricted the decision; parked for a human
    PendingApproval {
        /// The opened approval request
        approval: ApprovalId,
    },
    /// The cycle stopped before execution because the target's policy
    /// was replaced or withdrawn
    Cancelled,
    /// Executed and verification passed
    Completed,
    /// The gateway could not apply the change
    ExecutionFailed {
        /// Transport or cluster failure description
        reason: String,
    },
    /// Verification failed and the inverse was applied
    RolledBack,
    /// Verification failed and the inverse failed too, or none exists
    RollbackFailed {
        /// Context for the human taking over
        escalation: Escalation,
    },
}

impl CycleOutcome {
    /// Stable snake_case name for logs and metrics-free dashboards
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoAction { .. } => "no_action",
            Self::Blocked { .. } => "blocked",
            Self::PendingApproval { .. } => "pending_approval",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::RolledBack => "rolled_back",
            Self::RollbackFailed { .. } => "rollback_failed",
        }
    }

    /// True when the gateway was asked to apply the decision
    #[must_use]
    pub fn attempted_execution(&self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::ExecutionFailed { .. }
                | Self::RolledBack
                | Self::RollbackFailed { .. }
        )
    }

    /// True when only an operator can move the target forward
    #[inline]
    #[must_use]
    pub fn requires_human(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
