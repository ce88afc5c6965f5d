//! Governance enforcement
//!
//! Classifies decisions with ordered checks:
//!
//! 0. breaker gate: a blocked gate forces `forbidden`,
//!    reason `circuit_breaker_open`, over everything else
//! 1. forbidden list: blocked unconditionally, alternatives suggested
//! 2. restriction triggers: restricted list, an explicit
//!    `requires_approval` flag, scale step over `max_scale_step`,
//!    resource delta over `max_resource_delta`
//! 3. rate budget: an otherwise-allowed mutating action is downgraded
//!    to restricted once the hourly window fills
//!
//! The enforcer owns the governance-side state: the rolling rate
//! window, the cooldown stamps feeding the engine, and the approval
//! queue that restricted decisions park in.

use crate::approval::{ApprovalQueue, ApprovalRequest};
use crate::cooldown::CooldownTracker;
use crate::rate_limit::RateLimiter;
use crate::verdict::{GovernanceVerdict, REASON_CIRCUIT_BREAKER_OPEN, REASON_RATE_LIMIT_EXCEEDED};
use aog_breaker::ExecutionGate;
use aog_decision::Decision;
use aog_policy::{Policy, PolicyField, TargetId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Classifies decisions and keeps the governance-side state
#[derive(Debug)]
pub struct GovernanceEnforcer {
    approvals: Arc<ApprovalQueue>,
    rate: RateLimiter,
    cooldown: CooldownTracker,
}

impl GovernanceEnforcer {
    /// Create an enforcer sharing the given approval queue
    #[must_use]
    pub fn new(approvals: Arc<ApprovalQueue>) -> Self {
        Self {
            approvals,
            rate: RateLimiter::new(),
            cooldown: CooldownTracker::new(),
        }
    }

    /// The shared approval queue
    #[inline]
    #[must_use]
    pub fn approvals(&self) -> &Arc<ApprovalQueue> {
        &self.approvals
    }

    /// Classify one decision
    pub fn enforce(
        &self,
        decision: &Decision,
        policy: &Policy,
        gate: ExecutionGate,
        now: DateTime<Utc>,
    ) -> GovernanceVerdict {
        let kind = decision.kind();

        // Check 0: an open breaker overrides every other rule.
        if !gate.permits() {
            tracing::warn!(
                target_id = %decision.target,
                action = %kind,
                "blocked by open circuit breaker"
            );
            return GovernanceVerdict::forbidden(
                REASON_CIRCUIT_BREAKER_OPEN,
                vec![PolicyField::FailureThreshold, PolicyField::ResetTimeoutSecs],
                Vec::new(),
                now,
            );
        }

        // Check 1: forbidden list.
        if policy.is_forbidden(kind) {
            tracing::warn!(
                target_id = %decision.target,
                action = %kind,
                "action is in the forbidden list"
            );
            return GovernanceVerdict::forbidden(
                format!("action {kind} is in the forbidden list"),
                vec![PolicyField::ForbiddenActions],
                kind.suggested_alternatives().to_vec(),
                now,
            );
        }

        // Check 2: restriction triggers, first match names the reason.
        let governance = &policy.governance;
        let restriction = if policy.is_restricted(kind) {
            Some((
                format!("action {kind} is in the restricted list"),
                vec![PolicyField::RestrictedActions],
            ))
        } else if decision.requires_approval {
            Some((
                "decision flagged requires_approval".to_string(),
                Vec::new(),
            ))
        } else if decision.action.scale_delta() > governance.max_scale_step {
            Some((
                format!(
                    "scale delta {} exceeds max_scale_step {}",
                    decision.action.scale_delta(),
                    governance.max_scale_step,
                ),
                vec![PolicyField::MaxScaleStep],
            ))
        } else if decision.action.max_resource_difference() > governance.max_resource_delta {
            Some((
                format!(
                    "resource delta {:.3} exceeds max_resource_delta {:.3}",
                    decision.action.max_resource_difference(),
                    governance.max_resource_delta,
                ),
                vec![PolicyField::MaxResourceDelta],
            ))
        } else {
            None
        };
        if let Some((reason, refs)) = restriction {
            return self.restrict(decision, policy, reason, refs, now);
        }

        // Check 3: hourly budget, mutating actions only.
        if kind.is_mutating() {
            let executed = self.rate.count(&decision.target, now);
            if executed >= governance.max_operations_per_hour {
                tracing::info!(
                    target_id = %decision.target,
                    executed,
                    budget = governance.max_operations_per_hour,
                    "hourly operation budget exhausted"
                );
                return self.restrict(
                    decision,
                    policy,
                    REASON_RATE_LIMIT_EXCEEDED.to_string(),
                    vec![PolicyField::MaxOperationsPerHour],
                    now,
                );
            }
        }

        GovernanceVerdict::allowed("within autonomous bounds", Vec::new(), now)
    }

    /// Stamp one execution attempt for cooldown and rate accounting
    pub fn record_attempt(&self, target: &TargetId, at: DateTime<Utc>) {
        self.cooldown.record_attempt(target, at);
        self.rate.record(target, at);
    }

    /// Time since the target's last attempted operation
    #[must_use]
    pub fn elapsed_since_last_attempt(
        &self,
        target: &TargetId,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        self.cooldown.elapsed_since_last_attempt(target, now)
    }

    /// Drop a target's rate and cooldown state
    pub fn forget_target(&self, target: &TargetId) {
        self.rate.clear(target);
        self.cooldown.clear(target);
    }

    fn restrict(
        &self,
        decision: &Decision,
        policy: &Policy,
        reason: String,
        refs: Vec<PolicyField>,
        now: DateTime<Utc>,
    ) -> GovernanceVerdict {
        let governance = &policy.governance;
        let request = ApprovalRequest::new(
            decision.clone(),
            format!("{reason}; {}", decision.rationale),
            governance.approver_channel.clone(),
            now,
            now + chrono::Duration::seconds(
                i64::try_from(governance.approval_timeout_secs).unwrap_or(i64::MAX),
            ),
        );
        let approval_ref = self.approvals.submit(request);
        tracing::info!(
            target_id = %decision.target,
            action = %decision.kind(),
            approval = %approval_ref,
            %reason,
            "suspended pending approval"
        );
        GovernanceVerdict::restricted(reason, refs, approval_ref, now)
    }
}
