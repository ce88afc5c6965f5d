//! The governor: per-target control loops and the operator surface
//!
//! [`Governor`] owns everything a cycle needs: registered policies,
//! the breaker registry, governance state, the audit chain and the
//! alert fan-out. One call to [`Governor::run_cycle`] takes a target
//! through sample, decide, enforce, execute, verify and recover, and
//! seals the whole operation into the audit log whatever the outcome.
//!
//! Concurrency rules:
//! - at most one cycle per target at a time; a second caller gets
//!   [`GovernorError::CycleInFlight`] instead of queueing
//! - cycles for different targets are independent
//! - replacing or withdrawing a policy signals any in-flight cycle;
//!   the signal is honored before execution and during the
//!   stabilization wait, never during a rollback

use crate::alert::{Alert, AlertSink, TracingAlertSink};
use crate::audit::{
    AuditEntry, AuditRecord, AuditSink, MemoryAuditLog, OperationId, StageTimestamps,
};
use crate::config::GovernorConfig;
use crate::cycle::CycleOutcome;
use crate::error::{Escalation, GovernorError};
use aog_breaker::{BreakerEvent, BreakerHandle, BreakerRegistry, BreakerState, BreakerStatus};
use aog_decision::{
    decide, Decision, DecisionAction, DecisionContext, ExecutionCommand, ExecutionError,
    ExecutionGateway, ExecutionResult, NoActionReason,
};
use aog_governance::{
    ApprovalId, ApprovalQueue, ApprovalRequest, GovernanceEnforcer, GovernanceVerdict,
    REASON_CIRCUIT_BREAKER_OPEN,
};
use aog_metrics::MetricsProvider;
use aog_policy::{ActionKind, Policy, TargetId};
use aog_verify::{RecoveryDisposition, RollbackRecord, VerificationResult, VerifyController};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

/// Per-target runtime state
///
/// The watch channel carries a generation counter; every policy
/// replacement or withdrawal bumps it, and cycles compare against the
/// generation they subscribed at.
struct TargetEntry {
    policy: RwLock<Arc<Policy>>,
    cycle_guard: tokio::sync::Mutex<()>,
    cancel: watch::Sender<u64>,
}

/// What an operator chose for a pending approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalResolution {
    /// Run the held operation
    Approve,
    /// Drop the held operation
    Deny,
}

/// How a resolved approval ended
#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    /// The request was approved and the operation ran to an outcome
    Executed(AuditEntry),
    /// The request was denied; nothing ran
    Denied(ApprovalRequest),
}

/// Result of one [`Governor::run_all`] pass
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Audit entries for the cycles that ran
    pub completed: Vec<AuditEntry>,
    /// Targets not cycled this pass: already in flight, or withdrawn
    /// while the pass was running
    pub skipped: Vec<TargetId>,
}

/// The autonomous operations governor
///
/// Construct one with [`Governor::new`], register targets with
/// [`Governor::load_policy`], then drive it with [`Governor::run_cycle`]
/// or [`Governor::run_all`]. Every operation, breaker transition and
/// approval resolution lands in the embedded hash-chained audit log
/// and in any additional sinks registered with
/// [`Governor::with_audit_sink`].
pub struct Governor {
    config: GovernorConfig,
    metrics: Arc<dyn MetricsProvider>,
    gateway: Arc<dyn ExecutionGateway>,
    targets: DashMap<TargetId, Arc<TargetEntry>>,
    breakers: BreakerRegistry,
    enforcer: GovernanceEnforcer,
    audit_log: Arc<MemoryAuditLog>,
    audit_sinks: Vec<Arc<dyn AuditSink>>,
    alert_sinks: Vec<Arc<dyn AlertSink>>,
}

impl Governor {
    /// Create a governor with the default [`GovernorConfig`]
    #[must_use]
    pub fn new(metrics: Arc<dyn MetricsProvider>, gateway: Arc<dyn ExecutionGateway>) -> Self {
        Self::with_config(metrics, gateway, GovernorConfig::default())
    }

    /// Create a governor with an explicit config
    ///
    /// Alerts always reach the log via [`TracingAlertSink`]; sinks
    /// added later receive them as well.
    #[must_use]
    pub fn with_config(
        metrics: Arc<dyn MetricsProvider>,
        gateway: Arc<dyn ExecutionGateway>,
        config: GovernorConfig,
    ) -> Self {
        let audit_log = Arc::new(MemoryAuditLog::with_capacity(config.audit_buffer_size));
        Self {
            config,
            metrics,
            gateway,
            targets: DashMap::new(),
            breakers: BreakerRegistry::new(),
            enforcer: GovernanceEnforcer::new(Arc::new(ApprovalQueue::new())),
            audit_log,
            audit_sinks: Vec::new(),
            alert_sinks: vec![Arc::new(TracingAlertSink)],
        }
    }

    /// Register an additional audit sink
    ///
    /// Sink failures are logged and never fail the operation they
    /// record; the embedded log remains the source of truth.
    #[must_use]
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sinks.push(sink);
        self
    }

    /// Register an additional alert sink
    #[must_use]
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alert_sinks.push(sink);
        self
    }

    /// The runtime configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// The embedded hash-chained audit log
    #[inline]
    #[must_use]
    pub fn audit_log(&self) -> &Arc<MemoryAuditLog> {
        &self.audit_log
    }

    /// The shared approval queue
    #[inline]
    #[must_use]
    pub fn approvals(&self) -> &Arc<ApprovalQueue> {
        self.enforcer.approvals()
    }

    /// Registered targets, in no particular order
    #[must_use]
    pub fn targets(&self) -> Vec<TargetId> {
        self.targets.iter().map(|e| e.key().clone()).collect()
    }

    /// The active policy for a target
    #[must_use]
    pub fn policy_for(&self, target: &TargetId) -> Option<Arc<Policy>> {
        self.targets
            .get(target)
            .map(|entry| Arc::clone(&*entry.policy.read()))
    }

    /// The breaker view for a target
    #[must_use]
    pub fn breaker_status(&self, target: &TargetId) -> Option<BreakerStatus> {
        self.breakers.get(target).map(|handle| handle.lock().status())
    }

    /// Pending approval requests, oldest first
    #[must_use]
    pub fn pending_approvals(&self) -> Vec<ApprovalRequest> {
        self.enforcer.approvals().pending()
    }

    // ----- policy management -------------------------------------------

    /// Register a target or replace its policy
    ///
    /// The policy is validated before anything changes; an invalid one
    /// leaves the previous policy active. Replacement signals any
    /// in-flight cycle, which finishes its started stages under the
    /// policy it sampled with. Breaker state survives a replacement.
    pub fn load_policy(&self, target: TargetId, policy: Policy) -> Result<(), GovernorError> {
        policy
            .validate()
            .map_err(|source| GovernorError::InvalidPolicy {
                target: target.clone(),
                source,
            })?;
        let policy = Arc::new(policy);
        match self.targets.entry(target.clone()) {
            dashmap::mapref::entry::Entry::Occupied(slot) => {
                let entry = slot.get();
                *entry.policy.write() = Arc::clone(&policy);
                entry.cancel.send_modify(|generation| *generation += 1);
                self.breakers.update_policy(&target, &policy.breaker);
                tracing::info!(target_id = %target, "policy replaced");
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let (cancel, _seed) = watch::channel(0u64);
                slot.insert(Arc::new(TargetEntry {
                    policy: RwLock::new(Arc::clone(&policy)),
                    cycle_guard: tokio::sync::Mutex::new(()),
                    cancel,
                }));
                let _ = self.breakers.handle(&target, &policy.breaker);
                tracing::info!(target_id = %target, "target registered");
            }
        }
        Ok(())
    }

    /// Remove a target and all its runtime state
    ///
    /// Signals any in-flight cycle and waits for it to finish before
    /// dropping the entry, the breaker and the governance counters.
    /// An executed change is still verified; a running rollback still
    /// completes.
    pub async fn withdraw_policy(&self, target: &TargetId) -> Result<(), GovernorError> {
        let entry = self
            .targets
            .get(target)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| GovernorError::UnknownTarget(target.clone()))?;
        entry.cancel.send_modify(|generation| *generation += 1);
        let _guard = entry.cycle_guard.lock().await;
        self.targets.remove(target);
        self.breakers.remove(target);
        self.enforcer.forget_target(target);
        tracing::info!(target_id = %target, "target withdrawn");
        Ok(())
    }

    // ----- cycles ------------------------------------------------------

    /// Run one full control cycle for a target
    ///
    /// Returns the sealed audit entry for the operation. Errors are
    /// reserved for "the cycle did not run at all"; everything that
    /// happens inside a running cycle is expressed as its
    /// [`CycleOutcome`].
    pub async fn run_cycle(&self, target: &TargetId) -> Result<AuditEntry, GovernorError> {
        let entry = self
            .targets
            .get(target)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| GovernorError::UnknownTarget(target.clone()))?;
        let guard = entry
            .cycle_guard
            .try_lock()
            .map_err(|_| GovernorError::CycleInFlight(target.clone()))?;
        let report = self.cycle_locked(target, &entry).await;
        drop(guard);
        Ok(report)
    }

    /// Run one cycle for every registered target
    ///
    /// Cycles run concurrently; a target already mid-cycle (or
    /// withdrawn while the pass runs) is reported as skipped rather
    /// than waited on.
    pub async fn run_all(&self) -> RunReport {
        let targets = self.targets();
        let cycles = targets.iter().map(|target| self.run_cycle(target));
        let results = futures::future::join_all(cycles).await;
        let mut report = RunReport::default();
        for (target, result) in targets.into_iter().zip(results) {
            match result {
                Ok(entry) => report.completed.push(entry),
                Err(err) => {
                    tracing::debug!(target_id = %target, reason = %err, "cycle skipped");
                    report.skipped.push(target);
                }
            }
        }
        report
    }

    async fn cycle_locked(&self, target: &TargetId, entry: &TargetEntry) -> AuditEntry {
        let policy = Arc::clone(&*entry.policy.read());
        let mut cancel = entry.cancel.subscribe();
        let operation = OperationId::new();
        let mut stages = StageTimestamps::starting(Utc::now());
        tracing::debug!(target_id = %target, operation = %operation, "cycle started");

        // Stage: sample. A failed sample still produces a decision so
        // the outage itself lands in the audit trail.
        let sample = self.metrics.sample(target).await;
        stages.sampled_at = Some(Utc::now());

        // Stage: decide.
        let breaker = self.breakers.handle(target, &policy.breaker);
        let now = Utc::now();
        let decision = match &sample {
            Ok(snapshot) => {
                let status = breaker.lock().status();
                decide(&DecisionContext {
                    snapshot,
                    policy: &policy,
                    breaker: &status,
                    elapsed_since_last_attempt: self
                        .enforcer
                        .elapsed_since_last_attempt(target, now),
                    now,
                })
            }
            Err(err) => Decision::new(
                target.clone(),
                DecisionAction::NoAction {
                    reason: NoActionReason::MetricsUnavailable,
                },
                format!("metrics unavailable: {err}"),
                Vec::new(),
                now,
            ),
        };
        stages.decided_at = Some(Utc::now());
        tracing::debug!(
            target_id = %target,
            operation = %operation,
            action = decision.kind().as_str(),
            "decision proposed"
        );

        // Stage: enforce. The gate is previewed here; the probe slot
        // is only claimed once execution is certain.
        let now = Utc::now();
        let gate_preview = breaker.lock().peek(now);
        let verdict = self.enforcer.enforce(&decision, &policy, gate_preview, now);
        stages.enforced_at = Some(Utc::now());

        let mut execution: Option<ExecutionResult> = None;
        let mut verification: Option<VerificationResult> = None;
        let mut rollback: Option<RollbackRecord> = None;

        let outcome = if verdict.is_forbidden() {
            self.raise(Alert::forbidden_blocked(
                target.clone(),
                decision.kind().as_str(),
                &verdict.reason,
                now,
            ))
            .await;
            CycleOutcome::Blocked {
                reason: verdict.reason.clone(),
            }
        } else if verdict.is_restricted() {
            match verdict.approval_ref {
                Some(approval) => CycleOutcome::PendingApproval { approval },
                // Restricted verdicts always carry a request id.
                None => CycleOutcome::Blocked {
                    reason: verdict.reason.clone(),
                },
            }
        } else if let DecisionAction::NoAction { reason } = decision.action {
            CycleOutcome::NoAction { reason }
        } else if cancel.has_changed().unwrap_or(true) {
            // Policy replaced or withdrawn since this cycle started;
            // nothing has mutated yet, so stop here.
            tracing::info!(target_id = %target, operation = %operation, "cycle cancelled before execution");
            CycleOutcome::Cancelled
        } else {
            let (outcome, exec, verif, rb) = self
                .execute_and_verify(target, &policy, &decision, &breaker, operation, &mut stages, &mut cancel)
                .await;
            execution = exec;
            verification = verif;
            rollback = rb;
            outcome
        };

        stages.completed_at = Some(Utc::now());
        let entry = AuditEntry {
            operation,
            target: target.clone(),
            decision,
            verdict,
            execution,
            verification,
            rollback,
            outcome,
            stages,
        };
        tracing::info!(
            target_id = %target,
            operation = %operation,
            outcome = entry.outcome.label(),
            "cycle finished"
        );
        self.record_audit(AuditRecord::Operation(Box::new(entry.clone())))
            .await;
        entry
    }

    /// Claim the gate, execute, stabilize, verify, recover
    ///
    /// Shared by the cycle and by approved-request execution. The
    /// caller has already classified the work as allowed.
    #[allow(clippy::too_many_arguments)]
    async fn execute_and_verify(
        &self,
        target: &TargetId,
        policy: &Policy,
        decision: &Decision,
        breaker: &BreakerHandle,
        operation: OperationId,
        stages: &mut StageTimestamps,
        cancel: &mut watch::Receiver<u64>,
    ) -> (
        CycleOutcome,
        Option<ExecutionResult>,
        Option<VerificationResult>,
        Option<RollbackRecord>,
    ) {
        // Claim the gate for real; when half-open this consumes the
        // single probe slot.
        let claim_at = Utc::now();
        let (gate, gate_event) = breaker.lock().can_execute(claim_at);
        if let Some(event) = gate_event {
            self.audit_breaker_event(&event).await;
        }
        if !gate.permits() {
            return (
                CycleOutcome::Blocked {
                    reason: REASON_CIRCUIT_BREAKER_OPEN.to_string(),
                },
                None,
                None,
                None,
            );
        }

        let issued_at = Utc::now();
        self.enforcer.record_attempt(target, issued_at);
        let command = ExecutionCommand::new(target.clone(), decision.action.clone(), issued_at);
        tracing::info!(
            target_id = %target,
            operation = %operation,
            action = decision.kind().as_str(),
            "executing"
        );
        let attempt = match tokio::time::timeout(
            self.config.gateway_timeout(),
            self.gateway.execute(&command),
        )
        .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(err.to_string()),
            Err(_) => Err(ExecutionError::TimedOut {
                elapsed_secs: self.config.gateway_timeout_secs,
            }
            .to_string()),
        };
        stages.executed_at = Some(Utc::now());

        let result = match attempt {
            Err(reason) => {
                // Transport failure: no result reached us, but the
                // attempt still counts against the breaker.
                self.record_breaker_failure(target, breaker, &reason).await;
                tracing::warn!(target_id = %target, operation = %operation, %reason, "execution failed");
                return (CycleOutcome::ExecutionFailed { reason }, None, None, None);
            }
            Ok(result) if !result.succeeded() => {
                let reason = result
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| "execution failed".to_string());
                self.record_breaker_failure(target, breaker, &reason).await;
                tracing::warn!(target_id = %target, operation = %operation, %reason, "execution failed");
                return (
                    CycleOutcome::ExecutionFailed { reason },
                    Some(result),
                    None,
                    None,
                );
            }
            Ok(result) => result,
        };

        // Stage: verify. An executed change is never left unverified,
        // even when cancellation cut the stabilization wait short.
        let prior = result.prior.clone().unwrap_or_default();
        let wait = self.config.stabilization_for(policy.verification.stabilization());
        let controller = VerifyController::new(self.metrics.as_ref(), self.gateway.as_ref());
        let report = controller
            .verify_and_recover(target, &decision.action, &prior, &policy.verification, wait, cancel)
            .await;
        stages.verified_at = Some(Utc::now());
        if report.rollback.is_some() {
            stages.rolled_back_at = Some(Utc::now());
        }

        match report.disposition {
            RecoveryDisposition::Stable => {
                let event = breaker.lock().record_success(Utc::now());
                if let Some(event) = event {
                    self.audit_breaker_event(&event).await;
                }
                (
                    CycleOutcome::Completed,
                    Some(result),
                    Some(report.verification),
                    None,
                )
            }
            RecoveryDisposition::RolledBack => {
                // The original operation failed its verification; that
                // is what the breaker counts, not the successful undo.
                let reason = report.verification.describe_failures();
                self.record_breaker_failure(target, breaker, &reason).await;
                tracing::warn!(target_id = %target, operation = %operation, %reason, "verification failed, rolled back");
                (
                    CycleOutcome::RolledBack,
                    Some(result),
                    Some(report.verification),
                    report.rollback,
                )
            }
            RecoveryDisposition::RollbackFailed { reason }
            | RecoveryDisposition::NoInverse { reason } => {
                let failures = report.verification.describe_failures();
                self.record_breaker_failure(target, breaker, &failures).await;
                let escalation = Escalation::new(format!(
                    "automatic recovery failed for {target}: {reason}"
                ))
                .with_context("operation", decision.kind().as_str())
                .with_context("verification", failures)
                .with_step("inspect the target and restore its prior state by hand")
                .with_step("reset the breaker once the target is stable again");
                self.raise(Alert::rollback_failed(target.clone(), &escalation, Utc::now()))
                    .await;
                tracing::error!(target_id = %target, operation = %operation, %reason, "recovery failed, escalating");
                (
                    CycleOutcome::RollbackFailed { escalation },
                    Some(result),
                    Some(report.verification),
                    report.rollback,
                )
            }
        }
    }

    // ----- approvals ---------------------------------------------------

    /// Resolve a pending approval request
    ///
    /// Approval re-executes the held decision under the full execute
    /// and verify path, waiting its turn behind any in-flight cycle
    /// for the same target. Denial audits the resolution and drops the
    /// request. Either way the resolution lands in the audit log.
    pub async fn resolve_approval(
        &self,
        id: &ApprovalId,
        resolution: ApprovalResolution,
    ) -> Result<ApprovalOutcome, GovernorError> {
        let now = Utc::now();
        match resolution {
            ApprovalResolution::Deny => {
                let request = self.enforcer.approvals().deny(id, now)?;
                self.record_audit(AuditRecord::Approval {
                    request: Box::new(request.clone()),
                })
                .await;
                tracing::info!(target_id = %request.target, approval = %request.id, "approval denied");
                Ok(ApprovalOutcome::Denied(request))
            }
            ApprovalResolution::Approve => {
                let request = self.enforcer.approvals().approve(id, now)?;
                self.record_audit(AuditRecord::Approval {
                    request: Box::new(request.clone()),
                })
                .await;
                tracing::info!(target_id = %request.target, approval = %request.id, "approval granted");
                let entry = self.execute_approved(request).await?;
                Ok(ApprovalOutcome::Executed(entry))
            }
        }
    }

    /// Expire overdue approval requests and audit each one
    ///
    /// Returns the requests that expired in this sweep.
    pub async fn expire_approvals(&self) -> Vec<ApprovalRequest> {
        let expired = self.enforcer.approvals().expire_stale(Utc::now());
        for request in &expired {
            tracing::warn!(target_id = %request.target, approval = %request.id, "approval expired unresolved");
            self.record_audit(AuditRecord::Approval {
                request: Box::new(request.clone()),
            })
            .await;
        }
        expired
    }

    /// Spawn the background expiry sweeper
    ///
    /// Runs [`Governor::expire_approvals`] on the configured interval
    /// until the returned handle is aborted.
    #[must_use]
    pub fn spawn_approval_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let governor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(governor.config.approval_sweep_interval());
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                governor.expire_approvals().await;
            }
        })
    }

    async fn execute_approved(
        &self,
        request: ApprovalRequest,
    ) -> Result<AuditEntry, GovernorError> {
        let target = request.target.clone();
        let entry = self
            .targets
            .get(&target)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| GovernorError::UnknownTarget(target.clone()))?;
        // Operator calls wait their turn instead of bouncing off an
        // in-flight cycle.
        let _guard = entry.cycle_guard.lock().await;
        let policy = Arc::clone(&*entry.policy.read());
        let mut cancel = entry.cancel.subscribe();
        let operation = OperationId::new();
        let mut stages = StageTimestamps::starting(Utc::now());

        let now = Utc::now();
        let mut verdict = GovernanceVerdict::allowed(
            format!("approval {} granted by operator", request.id),
            Vec::new(),
            now,
        );
        verdict.approval_ref = Some(request.id);
        stages.enforced_at = Some(now);

        let decision = materialize_approved(&request.decision);
        let breaker = self.breakers.handle(&target, &policy.breaker);
        let (outcome, execution, verification, rollback) = self
            .execute_and_verify(&target, &policy, &decision, &breaker, operation, &mut stages, &mut cancel)
            .await;

        stages.completed_at = Some(Utc::now());
        let entry = AuditEntry {
            operation,
            target,
            decision,
            verdict,
            execution,
            verification,
            rollback,
            outcome,
            stages,
        };
        self.record_audit(AuditRecord::Operation(Box::new(entry.clone())))
            .await;
        Ok(entry)
    }

    // ----- breaker operations ------------------------------------------

    /// Force a target's breaker closed
    ///
    /// The reset is audited like any other breaker transition.
    pub async fn reset_breaker(&self, target: &TargetId) -> Result<BreakerEvent, GovernorError> {
        let event = self
            .breakers
            .manual_reset(target)
            .ok_or_else(|| GovernorError::UnknownTarget(target.clone()))?;
        tracing::info!(target_id = %target, "breaker manually reset");
        self.audit_breaker_event(&event).await;
        Ok(event)
    }

    async fn record_breaker_failure(
        &self,
        target: &TargetId,
        breaker: &BreakerHandle,
        reason: &str,
    ) {
        let event = breaker.lock().record_failure(Utc::now(), reason);
        if let Some(event) = event {
            if event.new_state() == BreakerState::Open {
                let failures = match &event {
                    BreakerEvent::Opened { failures, .. } => failures.len() as u32,
                    _ => 0,
                };
                self.raise(Alert::breaker_opened(target.clone(), failures, Utc::now()))
                    .await;
            }
            self.audit_breaker_event(&event).await;
        }
    }

    // ----- sinks -------------------------------------------------------

    async fn audit_breaker_event(&self, event: &BreakerEvent) {
        self.record_audit(AuditRecord::Breaker {
            event: event.clone(),
        })
        .await;
    }

    async fn record_audit(&self, record: AuditRecord) {
        if let Err(err) = self.audit_log.record(&record).await {
            tracing::error!(error = %err, "embedded audit log rejected a record");
        }
        for sink in &self.audit_sinks {
            if let Err(err) = sink.record(&record).await {
                tracing::error!(error = %err, "audit sink failed; continuing");
            }
        }
    }

    async fn raise(&self, alert: Alert) {
        for sink in &self.alert_sinks {
            sink.raise(&alert).await;
        }
    }
}

/// Turn an approved decision into the action that actually runs
///
/// An approved escalation runs its recommended follow-up when that
/// follow-up carries no parameters of its own; every other decision
/// runs as held.
fn materialize_approved(decision: &Decision) -> Decision {
    let action = match &decision.action {
        DecisionAction::EscalateToApproval { recommended } => match recommended {
            ActionKind::RollbackDeployment => DecisionAction::RollbackDeployment,
            ActionKind::TriggerRollback => DecisionAction::TriggerRollback,
            ActionKind::RestartPod => DecisionAction::RestartPod,
            _ => decision.action.clone(),
        },
        other => other.clone(),
    };
    Decision {
        action,
        ..decision.clone()
    }
}
