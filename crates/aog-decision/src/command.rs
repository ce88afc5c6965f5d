//! Execution gateway surface
//!
//! The governor never talks to a cluster API directly. Approved work
//! is handed to an [`ExecutionGateway`] as an [`ExecutionCommand`];
//! the gateway captures the pre-operation state, applies the change,
//! and reports an [`ExecutionResult`]. Transport-level problems are
//! the typed [`ExecutionError`], distinct from a command that reached
//! the cluster and failed there. Both count as breaker failures.

use crate::action::DecisionAction;
use aog_policy::TargetId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of work handed to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionCommand {
    /// Target the command applies to
    pub target: TargetId,
    /// The action to apply
    pub action: DecisionAction,
    /// When the governor issued the command
    pub issued_at: DateTime<Utc>,
}

impl ExecutionCommand {
    /// Create a command
    #[must_use]
    pub fn new(target: TargetId, action: DecisionAction, issued_at: DateTime<Utc>) -> Self {
        Self {
            target,
            action,
            issued_at,
        }
    }
}

/// State captured by the gateway before it mutates anything
///
/// Fields the gateway could not observe are `None`; the rollback
/// planner falls back to the decision's own parameters where it can.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriorState {
    /// Replica count before the operation
    pub replicas: Option<u32>,
    /// CPU request in millicores before the operation
    pub cpu_request_millis: Option<f64>,
    /// Memory request in MiB before the operation
    pub memory_request_mib: Option<f64>,
    /// Deployment revision before the operation
    pub revision: Option<String>,
}

/// What happened to a command that reached the cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the change was applied
    pub success: bool,
    /// Failure description when the change was not applied
    pub failure_reason: Option<String>,
    /// Pre-operation state, when the gateway captured one
    ///
    /// Present on failures too: a partially applied change still needs
    /// its prior state for rollback.
    pub prior: Option<PriorState>,
    /// When the gateway finished
    pub completed_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// A successfully applied change
    #[must_use]
    pub fn applied(prior: PriorState, completed_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            failure_reason: None,
            prior: Some(prior),
            completed_at,
        }
    }

    /// A change the cluster rejected or failed to apply
    #[must_use]
    pub fn failed(reason: impl Into<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            failure_reason: Some(reason.into()),
            prior: None,
            completed_at,
        }
    }

    /// Attach the captured prior state
    #[must_use]
    pub fn with_prior(mut self, prior: PriorState) -> Self {
        self.prior = Some(prior);
        self
    }

    /// True when the change was applied
    #[inline]
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.success
    }
}

/// The inverse operations the gateway can be asked to apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RollbackOp {
    /// Scale back to the pre-operation replica count
    RestoreReplicas {
        /// Replica count to restore
        replicas: u32,
    },
    /// Restore the pre-operation resource requests
    RestoreResources {
        /// CPU request in millicores, when it was captured
        cpu_request_millis: Option<f64>,
        /// Memory request in MiB, when it was captured
        memory_request_mib: Option<f64>,
    },
    /// Revert the deployment to a prior revision
    RevertToRevision {
        /// Revision identifier to revert to
        revision: String,
    },
}

impl RollbackOp {
    /// Stable snake_case name for audit records
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestoreReplicas { .. } => "restore_replicas",
            Self::RestoreResources { .. } => "restore_resources",
            Self::RevertToRevision { .. } => "revert_to_revision",
        }
    }
}

/// Transport-level failure talking to the cluster
///
/// A command that reached the cluster and failed there is a failed
/// [`ExecutionResult`], not one of these.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The gateway could not reach the cluster API
    #[error("execution gateway unreachable: {0}")]
    Unreachable(String),
    /// The gateway did not answer within the configured deadline
    #[error("execution timed out after {elapsed_secs}s")]
    TimedOut {
        /// Seconds waited before giving up
        elapsed_secs: u64,
    },
    /// The gateway refused the command outright
    #[error("execution rejected: {0}")]
    Rejected(String),
}

/// Applies commands to the managed system
///
/// Implementations capture prior state before mutating so the
/// verification controller can plan an inverse.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    /// Apply a decided action
    async fn execute(&self, command: &ExecutionCommand)
        -> Result<ExecutionResult, ExecutionError>;

    /// Apply an inverse operation computed from a failed verification
    async fn rollback(
        &self,
        target: &TargetId,
        op: &RollbackOp,
    ) -> Result<ExecutionResult, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applied_result_carries_prior_state() {
        let result = ExecutionResult::applied(
            PriorState {
                replicas: Some(2),
                ..PriorState::default()
            },
            Utc::now(),
        );
        assert!(result.succeeded());
        assert!(result.failure_reason.is_none());
        assert_eq!(result.prior.as_ref().and_then(|p| p.replicas), Some(2));
    }

    #[test]
    fn failed_result_can_attach_partial_prior() {
        let result = ExecutionResult::failed("api rejected patch", Utc::now()).with_prior(
            PriorState {
                replicas: Some(4),
                ..PriorState::default()
            },
        );
        assert!(!result.succeeded());
        assert_eq!(result.failure_reason.as_deref(), Some("api rejected patch"));
        assert!(result.prior.is_some());
    }

    #[test]
    fn error_display_names_the_transport_problem() {
        let err = ExecutionError::TimedOut { elapsed_secs: 30 };
        assert_eq!(err.to_string(), "execution timed out after 30s");
        let err = ExecutionError::Unreachable("dns failure".to_string());
        assert!(err.to_string().contains("dns failure"));
    }

    #[test]
    fn rollback_op_serde_tag_is_snake_case() {
        let op = RollbackOp::RestoreReplicas { replicas: 2 };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"op\":\"restore_replicas\""));
        assert_eq!(op.as_str(), "restore_replicas");
    }

    #[tokio::test]
    async fn gateway_trait_is_object_safe() {
        struct AlwaysApplies;

        #[async_trait]
        impl ExecutionGateway for AlwaysApplies {
            async fn execute(
                &self,
                _command: &ExecutionCommand,
            ) -> Result<ExecutionResult, ExecutionError> {
                Ok(ExecutionResult::applied(PriorState::default(), Utc::now()))
            }

            async fn rollback(
                &self,
                _target: &TargetId,
                _op: &RollbackOp,
            ) -> Result<ExecutionResult, ExecutionError> {
                Ok(ExecutionResult::applied(PriorState::default(), Utc::now()))
            }
        }

        let gateway: Box<dyn ExecutionGateway> = Box::new(AlwaysApplies);
        let command = ExecutionCommand::new(
            TargetId::new("web"),
            DecisionAction::RestartPod,
            Utc::now(),
        );
        let result = gateway.execute(&command).await.unwrap();
        assert!(result.succeeded());
    }
}
