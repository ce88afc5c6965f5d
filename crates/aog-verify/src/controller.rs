//! Verification and rollback controller
//!
//! After the gateway applies a change, the controller waits out the
//! stabilization period, re-samples the target, and compares the
//! snapshot against the verification thresholds. A failed comparison
//! triggers at most one rollback: the planned inverse is dispatched,
//! re-verified, and recorded. The rollback itself is never raced
//! against cancellation; once dispatched it runs to completion.

use crate::result::{verify, VerificationResult};
use crate::rollback::{plan_rollback, InversePlan, RollbackRecord};
use aog_decision::{DecisionAction, ExecutionGateway, PriorState};
use aog_metrics::MetricsProvider;
use aog_policy::{TargetId, VerificationPolicy};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// What the controller concluded about an executed operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum RecoveryDisposition {
    /// Verification passed; nothing to undo
    Stable,
    /// Verification failed and the inverse was applied
    RolledBack,
    /// Verification failed and the inverse could not be applied
    RollbackFailed {
        /// Gateway or cluster failure description
        reason: String,
    },
    /// Verification failed and the action has no inverse
    NoInverse {
        /// Why nothing could be applied
        reason: String,
    },
}

/// Verification plus whatever recovery it forced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryReport {
    /// The post-stabilization comparison
    pub verification: VerificationResult,
    /// The rollback attempt, when one was dispatched
    pub rollback: Option<RollbackRecord>,
    /// Summary of how the operation ended
    pub disposition: RecoveryDisposition,
}

impl RecoveryReport {
    /// True when the operation ended healthy without intervention
    #[inline]
    #[must_use]
    pub fn is_stable(&self) -> bool {
        matches!(self.disposition, RecoveryDisposition::Stable)
    }
}

/// Drives stabilization, re-sampling, and the single rollback attempt
pub struct VerifyController<'a> {
    metrics: &'a dyn MetricsProvider,
    gateway: &'a dyn ExecutionGateway,
}

impl<'a> VerifyController<'a> {
    /// Borrow the two seams the controller needs
    #[must_use]
    pub fn new(metrics: &'a dyn MetricsProvider, gateway: &'a dyn ExecutionGateway) -> Self {
        Self { metrics, gateway }
    }

    /// Wait out the stabilization period, or less if cancelled
    ///
    /// Returns true when the wait was cut short. Cancellation only
    /// shortens the wait; the verification that follows still runs, so
    /// an executed change is never left unchecked.
    pub async fn stabilize(&self, wait: Duration, cancel: &mut watch::Receiver<u64>) -> bool {
        tokio::select! {
            () = tokio::time::sleep(wait) => false,
            _ = cancel.changed() => {
                tracing::debug!(wait_secs = wait.as_secs(), "stabilization wait cut short");
                true
            }
        }
    }

    /// Re-sample the target and compare against the thresholds
    ///
    /// A provider error yields an all-unmeasured result: an absent
    /// pipeline is not evidence that the operation failed.
    pub async fn check(
        &self,
        target: &TargetId,
        policy: &VerificationPolicy,
    ) -> VerificationResult {
        match self.metrics.sample(target).await {
            Ok(snapshot) => verify(&snapshot, policy),
            Err(err) => {
                tracing::warn!(target_id = %target, error = %err, "re-sample failed, recording unmeasured");
                VerificationResult::unmeasured(target.clone(), policy, Utc::now())
            }
        }
    }

    /// Full post-execution pass: stabilize, verify, roll back if needed
    #[allow(clippy::too_many_lines)]
    pub async fn verify_and_recover(
        &self,
        target: &TargetId,
        action: &DecisionAction,
        prior: &PriorState,
        policy: &VerificationPolicy,
        wait: Duration,
        cancel: &mut watch::Receiver<u64>,
    ) -> RecoveryReport {
        self.stabilize(wait, cancel).await;
        let verification = self.check(target, policy).await;
        if verification.passed() {
            return RecoveryReport {
                verification,
                rollback: None,
                disposition: RecoveryDisposition::Stable,
            };
        }
        tracing::warn!(
            target_id = %target,
            failed = ?verification.failed_dimensions(),
            "verification failed, planning rollback"
        );

        match plan_rollback(action, prior) {
            InversePlan::Invert { op } => {
                let started_at = Utc::now();
                let timer = std::time::Instant::now();
                let outcome = self.gateway.rollback(target, &op).await;
                let duration_ms = u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX);
                match outcome {
                    Ok(result) if result.succeeded() => {
                        let final_state = self.check(target, policy).await;
                        tracing::info!(
                            target_id = %target,
                            op = op.as_str(),
                            duration_ms,
                            recovered = final_state.passed(),
                            "rollback applied"
                        );
                        RecoveryReport {
                            verification,
                            rollback: Some(RollbackRecord {
                                op,
                                succeeded: true,
                                failure_reason: None,
                                started_at,
                                duration_ms,
                                final_state: Some(final_state),
                            }),
                            disposition: RecoveryDisposition::RolledBack,
                        }
                    }
                    Ok(result) => {
                        let reason = result
                            .failure_reason
                            .unwrap_or_else(|| "rollback not applied".to_string());
                        tracing::error!(target_id = %target, op = op.as_str(), %reason, "rollback failed");
                        RecoveryReport {
                            verification,
                            rollback: Some(RollbackRecord {
                                op,
                                succeeded: false,
                                failure_reason: Some(reason.clone()),
                                started_at,
                                duration_ms,
                                final_state: None,
                            }),
                            disposition: RecoveryDisposition::RollbackFailed { reason },
                        }
                    }
                    Err(err) => {
                        let reason = err.to_string();
                        tracing::error!(target_id = %target, op = op.as_str(), %reason, "rollback failed");
                        RecoveryReport {
                            verification,
                            rollback: Some(RollbackRecord {
                                op,
                                succeeded: false,
                                failure_reason: Some(reason.clone()),
                                started_at,
                                duration_ms,
                                final_state: None,
                            }),
                            disposition: RecoveryDisposition::RollbackFailed { reason },
                        }
                    }
                }
            }
            InversePlan::NoInverse { reason } => {
                tracing::error!(target_id = %target, %reason, "verification failed with no inverse");
                RecoveryReport {
                    verification,
                    rollback: None,
                    disposition: RecoveryDisposition::NoInverse { reason },
                }
            }
            // Non-mutating actions never reach execution; nothing ran,
            // so there is nothing to undo.
            InversePlan::NotApplicable => RecoveryReport {
                verification,
                rollback: None,
                disposition: RecoveryDisposition::NoInverse {
                    reason: "action does not execute".to_string(),
                },
            },
        }
    }
}
