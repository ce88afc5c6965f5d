//! Decision records
//!
//! A [`Decision`] pairs a proposed action with the evidence behind
//! it: a human-readable rationale that embeds the numbers that drove
//! the choice, and references to the policy fields consulted. Every
//! decision that proposes work cites at least one policy field.

use crate::action::DecisionAction;
use aog_policy::{ActionKind, PolicyField, TargetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One evaluated proposal for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Target the decision applies to
    pub target: TargetId,
    /// The proposed action with its parameters
    pub action: DecisionAction,
    /// Why, with the observed and threshold values spelled out
    pub rationale: String,
    /// Policy fields that influenced this decision
    pub policy_refs: Vec<PolicyField>,
    /// Whether the engine itself asks for human sign-off
    pub requires_approval: bool,
    /// When the engine evaluated the inputs
    pub decided_at: DateTime<Utc>,
}

impl Decision {
    /// Creates a decision. Non-`no_action` decisions must cite at
    /// least one policy field.
    #[must_use]
    pub fn new(
        target: TargetId,
        action: DecisionAction,
        rationale: impl Into<String>,
        policy_refs: Vec<PolicyField>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        debug_assert!(
            matches!(action, DecisionAction::NoAction { .. }) || !policy_refs.is_empty(),
            "a proposing decision must cite the policy fields it consulted"
        );
        Self {
            target,
            action,
            rationale: rationale.into(),
            policy_refs,
            requires_approval: false,
            decided_at,
        }
    }

    /// Marks the decision as needing human approval before execution
    #[must_use]
    pub fn with_approval_required(mut self) -> Self {
        self.requires_approval = true;
        self
    }

    /// Governance classification of the proposed action
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// True when the engine proposed nothing
    #[inline]
    #[must_use]
    pub fn is_no_action(&self) -> bool {
        matches!(self.action, DecisionAction::NoAction { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::NoActionReason;

    fn target() -> TargetId {
        TargetId::new("payments-api")
    }

    #[test]
    fn proposing_decision_carries_refs() {
        let decision = Decision::new(
            target(),
            DecisionAction::ScaleUp {
                from_replicas: 2,
                to_replicas: 3,
            },
            "utilization above threshold",
            vec![PolicyField::ScaleUpThreshold, PolicyField::MaxReplicas],
            Utc::now(),
        );
        assert_eq!(decision.kind(), ActionKind::ScaleUp);
        assert!(!decision.is_no_action());
        assert!(!decision.requires_approval);
        assert_eq!(decision.policy_refs.len(), 2);
    }

    #[test]
    fn no_action_allows_empty_refs() {
        let decision = Decision::new(
            target(),
            DecisionAction::NoAction {
                reason: NoActionReason::WithinThresholds,
            },
            "all readings inside thresholds",
            vec![],
            Utc::now(),
        );
        assert!(decision.is_no_action());
    }

    #[test]
    fn approval_flag_is_opt_in() {
        let decision = Decision::new(
            target(),
            DecisionAction::RestartPod,
            "restart count 2 below rollback threshold 3",
            vec![PolicyField::MaxRestartCount],
            Utc::now(),
        )
        .with_approval_required();
        assert!(decision.requires_approval);
    }

    #[test]
    #[should_panic(expected = "policy fields")]
    fn proposing_without_refs_panics_in_debug() {
        let _ = Decision::new(
            target(),
            DecisionAction::RestartPod,
            "no refs",
            vec![],
            Utc::now(),
        );
    }
}
