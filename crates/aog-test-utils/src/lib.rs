//! Testing utilities for the AOG workspace
//!
//! Shared fixtures, fake providers and gateways, and collecting sinks.

#![allow(missing_docs)]

use aog_core::{Alert, AlertSink, AuditError, AuditRecord, AuditSink};
use aog_decision::{
    DecisionAction, ExecutionCommand, ExecutionError, ExecutionGateway, ExecutionResult,
    PriorState, RollbackOp,
};
use aog_metrics::{MetricSnapshot, MetricsError, MetricsProvider};
use aog_policy::{Policy, TargetId};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Canonical test instant: 2025-06-01 12:00:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// The policy the scenario tests run against
///
/// Policy defaults with two adjustments: replicas capped at 5, and a
/// 200ms latency target so the fixture snapshots land where the names
/// say they do (hot scores 0.815, calm 0.5).
pub fn canonical_policy() -> Policy {
    let mut policy = Policy::default();
    policy.scaling.max_replicas = 5;
    policy.verification.latency_target_ms = 200.0;
    policy
}

/// Readings that score 0.815 weighted utilization: one step over the
/// 0.80 scale-up threshold
pub fn hot_snapshot(target: &TargetId, taken_at: DateTime<Utc>) -> MetricSnapshot {
    MetricSnapshot::at(target.clone(), taken_at)
        .with_cpu_utilization(0.85)
        .with_memory_utilization(0.70)
        .with_latency_p95_ms(180.0)
        .with_error_rate(0.002)
        .with_availability(0.999)
        .with_replicas(2)
        .with_all_pods_healthy(true)
}

/// Readings that score 0.13 on a single replica: a scale-down that the
/// replica floor blocks
pub fn idle_snapshot(target: &TargetId, taken_at: DateTime<Utc>) -> MetricSnapshot {
    MetricSnapshot::at(target.clone(), taken_at)
        .with_cpu_utilization(0.10)
        .with_memory_utilization(0.10)
        .with_latency_p95_ms(50.0)
        .with_error_rate(0.0)
        .with_availability(1.0)
        .with_replicas(1)
        .with_all_pods_healthy(true)
}

/// Readings that score 0.5: inside the threshold band, nothing to do
pub fn calm_snapshot(target: &TargetId, taken_at: DateTime<Utc>) -> MetricSnapshot {
    MetricSnapshot::at(target.clone(), taken_at)
        .with_cpu_utilization(0.50)
        .with_memory_utilization(0.50)
        .with_latency_p95_ms(100.0)
        .with_error_rate(0.001)
        .with_availability(0.999)
        .with_replicas(2)
        .with_all_pods_healthy(true)
}

/// Readings that fail verification against [`canonical_policy`]:
/// latency 280 over the 200 target, error rate 0.012 over the 0.01 cap
pub fn degraded_snapshot(target: &TargetId, taken_at: DateTime<Utc>) -> MetricSnapshot {
    MetricSnapshot::at(target.clone(), taken_at)
        .with_cpu_utilization(0.90)
        .with_memory_utilization(0.80)
        .with_latency_p95_ms(280.0)
        .with_error_rate(0.012)
        .with_availability(0.97)
        .with_replicas(3)
        .with_all_pods_healthy(true)
}

/// Provider that returns the same snapshot on every sample
pub struct StaticMetrics {
    snapshot: Mutex<MetricSnapshot>,
}

impl StaticMetrics {
    pub fn new(snapshot: MetricSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }

    /// Swap the snapshot subsequent samples will see
    pub fn set(&self, snapshot: MetricSnapshot) {
        *self.snapshot.lock() = snapshot;
    }
}

#[async_trait]
impl MetricsProvider for StaticMetrics {
    async fn sample(&self, _target: &TargetId) -> Result<MetricSnapshot, MetricsError> {
        Ok(self.snapshot.lock().clone())
    }
}

/// Provider that replays a scripted sequence of samples
///
/// An exhausted script reports `NoData` rather than repeating, so a
/// test that samples more than it scripted fails loudly.
pub struct SequenceMetrics {
    samples: Mutex<VecDeque<Result<MetricSnapshot, MetricsError>>>,
}

impl SequenceMetrics {
    pub fn new(samples: Vec<Result<MetricSnapshot, MetricsError>>) -> Self {
        Self {
            samples: Mutex::new(samples.into()),
        }
    }

    pub fn push(&self, sample: Result<MetricSnapshot, MetricsError>) {
        self.samples.lock().push_back(sample);
    }

    pub fn remaining(&self) -> usize {
        self.samples.lock().len()
    }
}

#[async_trait]
impl MetricsProvider for SequenceMetrics {
    async fn sample(&self, target: &TargetId) -> Result<MetricSnapshot, MetricsError> {
        self.samples.lock().pop_front().unwrap_or_else(|| {
            Err(MetricsError::NoData(
                target.clone(),
                "scripted sample sequence exhausted".to_string(),
            ))
        })
    }
}

/// Provider whose pipeline is always down
pub struct FailingMetrics;

#[async_trait]
impl MetricsProvider for FailingMetrics {
    async fn sample(&self, _target: &TargetId) -> Result<MetricSnapshot, MetricsError> {
        Err(MetricsError::Unreachable("fixture outage".to_string()))
    }
}

/// Gateway fake with optional scripted results
///
/// Unscripted calls succeed with a prior state derived from the
/// command, which is what a well-behaved gateway would capture.
/// Every call is recorded for assertions.
#[derive(Default)]
pub struct ScriptedGateway {
    execute_script: Mutex<VecDeque<Result<ExecutionResult, ExecutionError>>>,
    rollback_script: Mutex<VecDeque<Result<ExecutionResult, ExecutionError>>>,
    executed: Mutex<Vec<ExecutionCommand>>,
    rolled_back: Mutex<Vec<(TargetId, RollbackOp)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result for the next unscripted `execute` call
    pub fn script_execute(&self, result: Result<ExecutionResult, ExecutionError>) {
        self.execute_script.lock().push_back(result);
    }

    /// Queue the result for the next unscripted `rollback` call
    pub fn script_rollback(&self, result: Result<ExecutionResult, ExecutionError>) {
        self.rollback_script.lock().push_back(result);
    }

    /// Commands handed to `execute`, in call order
    pub fn executed(&self) -> Vec<ExecutionCommand> {
        self.executed.lock().clone()
    }

    /// Inverse operations handed to `rollback`, in call order
    pub fn rolled_back(&self) -> Vec<(TargetId, RollbackOp)> {
        self.rolled_back.lock().clone()
    }
}

/// The prior state a cooperative gateway would capture for a command
pub fn prior_for(command: &ExecutionCommand) -> PriorState {
    let mut prior = PriorState {
        revision: Some("rev-41".to_string()),
        ..PriorState::default()
    };
    match &command.action {
        DecisionAction::ScaleUp { from_replicas, .. }
        | DecisionAction::ScaleDown { from_replicas, .. } => {
            prior.replicas = Some(*from_replicas);
        }
        DecisionAction::OptimizeResources { .. } => {
            prior.cpu_request_millis = Some(1000.0);
            prior.memory_request_mib = Some(2048.0);
        }
        _ => {}
    }
    prior
}

#[async_trait]
impl ExecutionGateway for ScriptedGateway {
    async fn execute(&self, command: &ExecutionCommand) -> Result<ExecutionResult, ExecutionError> {
        self.executed.lock().push(command.clone());
        if let Some(scripted) = self.execute_script.lock().pop_front() {
            return scripted;
        }
        Ok(ExecutionResult::applied(prior_for(command), Utc::now()))
    }

    async fn rollback(
        &self,
        target: &TargetId,
        op: &RollbackOp,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.rolled_back.lock().push((target.clone(), op.clone()));
        if let Some(scripted) = self.rollback_script.lock().pop_front() {
            return scripted;
        }
        Ok(ExecutionResult::applied(PriorState::default(), Utc::now()))
    }
}

/// Audit sink that keeps everything it is handed
#[derive(Default)]
pub struct CollectingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl CollectingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for CollectingAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Alert sink that keeps everything it is handed
#[derive(Default)]
pub struct CollectingAlertSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CollectingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }
}

#[async_trait]
impl AlertSink for CollectingAlertSink {
    async fn raise(&self, alert: &Alert) {
        self.alerts.lock().push(alert.clone());
    }
}

/// Install a test subscriber honoring `RUST_LOG`; repeated calls are fine
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
