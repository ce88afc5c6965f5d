//! Governor error types
//!
//! Most of what can go wrong in a cycle is not an error here: cooldown
//! holds, rate limits, blocked verdicts, failed executions, and failed
//! verifications are ordinary outcomes that land in the audit trail.
//! [`GovernorError`] covers only what stops an entry point from
//! producing an outcome at all. [`Escalation`] is the structured
//! context handed to a human when automation gives up on a target.

use aog_governance::ApprovalError;
use aog_policy::{PolicyError, TargetId};
use serde::{Deserialize, Serialize};

/// Errors from the governor's entry points
#[derive(Debug, thiserror::Error)]
pub enum GovernorError {
    /// No policy is loaded for the target
    #[error("unknown target {0}")]
    UnknownTarget(TargetId),

    /// The submitted policy failed validation and was not applied
    #[error("invalid policy for {target}: {source}")]
    InvalidPolicy {
        /// Target the rejected policy was meant for
        target: TargetId,
        /// The validation failure
        #[source]
        source: PolicyError,
    },

    /// A cycle for this target is already running
    #[error("cycle already in flight for {0}")]
    CycleInFlight(TargetId),

    /// The approval queue rejected the resolution
    #[error("approval error: {0}")]
    Approval(#[from] ApprovalError),
}

impl GovernorError {
    /// True when the same call could succeed if retried later
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CycleInFlight(_))
    }

    /// True when only an operator can move things forward
    #[inline]
    #[must_use]
    pub fn requires_human(&self) -> bool {
        matches!(
            self,
            Self::InvalidPolicy { .. } | Self::Approval(ApprovalError::Expired { .. })
        )
    }
}

/// Context handed to a human when automation cannot recover
///
/// Attached to rollback failures and no-inverse verifications; the
/// critical alert and the audit entry both carry the same one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    /// One-line account of what went wrong
    pub summary: String,
    /// Key-value context pairs a responder will want first
    pub context: Vec<(String, String)>,
    /// Ordered suggestions for the responder
    pub suggested_next_steps: Vec<String>,
}

impl Escalation {
    /// Start an escalation with its summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            context: Vec::new(),
            suggested_next_steps: Vec::new(),
        }
    }

    /// Add a context pair
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Add a suggested next step
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.suggested_next_steps.push(step.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_target() {
        let err = GovernorError::UnknownTarget(TargetId::new("web"));
        assert_eq!(err.to_string(), "unknown target web");
    }

    #[test]
    fn in_flight_is_retryable_but_not_human() {
        let err = GovernorError::CycleInFlight(TargetId::new("web"));
        assert!(err.is_retryable());
        assert!(!err.requires_human());
    }

    #[test]
    fn invalid_policy_requires_human() {
        let err = GovernorError::InvalidPolicy {
            target: TargetId::new("web"),
            source: PolicyError::WeightSum { sum: 1.2 },
        };
        assert!(err.requires_human());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("invalid policy for web"));
    }

    #[test]
    fn escalation_builder_accumulates() {
        let escalation = Escalation::new("rollback failed for web")
            .with_context("operation", "scale_up")
            .with_context("rollback_op", "restore_replicas")
            .with_step("verify replica count by hand")
            .with_step("reset the breaker once stable");
        assert_eq!(escalation.context.len(), 2);
        assert_eq!(escalation.suggested_next_steps.len(), 2);
        let json = serde_json::to_string(&escalation).unwrap();
        assert!(json.contains("rollback failed for web"));
    }
}
