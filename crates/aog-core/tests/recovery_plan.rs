//! Functional tests for verification, rollback, and breaker feedback.
//!
//! These tests cover the safety half of the control loop:
//! - a failed verification triggers exactly one rollback to the prior
//!   state, and the original operation counts as a breaker failure
//! - a failed rollback escalates critically and demands a human
//! - three failures inside the window open the breaker; the fourth
//!   cycle is blocked with `circuit_breaker_open`
//! - a manual reset is audited and reopens the path

use aog_core::{AlertSeverity, AuditRecord, CycleOutcome, Governor};
use aog_decision::{DecisionAction, ExecutionError, RollbackOp};
use aog_policy::{Policy, TargetId};
use aog_test_utils::{
    calm_snapshot, canonical_policy, degraded_snapshot, hot_snapshot, init_tracing, t0,
    CollectingAlertSink, ScriptedGateway, SequenceMetrics, StaticMetrics,
};
use std::sync::Arc;

fn target() -> TargetId {
    TargetId::new("web-frontend")
}

/// Canonical policy without the cooldown, for back-to-back cycles
fn rapid_policy() -> Policy {
    let mut policy = canonical_policy();
    policy.scaling.cooldown_secs = 0;
    policy
}

/// Tenet: post-execution metrics over the verification thresholds
/// produce one rollback to the captured prior state, and the breaker
/// counts the original operation as a failure.
///
/// Latency 280 against the 200 target and error rate 0.012 against
/// the 0.01 cap both fail; the undo restores the prior 2 replicas.
#[tokio::test(start_paused = true)]
async fn failed_verification_rolls_back_and_feeds_breaker() -> anyhow::Result<()> {
    init_tracing();
    let metrics = Arc::new(SequenceMetrics::new(vec![
        Ok(hot_snapshot(&target(), t0())),      // cycle sample
        Ok(degraded_snapshot(&target(), t0())), // post-stabilization check
        Ok(calm_snapshot(&target(), t0())),     // post-rollback check
    ]));
    let gateway = Arc::new(ScriptedGateway::new());
    let governor = Governor::new(metrics, Arc::clone(&gateway) as _);
    governor.load_policy(target(), canonical_policy())?;

    let entry = governor.run_cycle(&target()).await?;

    assert_eq!(entry.outcome, CycleOutcome::RolledBack);
    let verification = entry.verification.as_ref().unwrap();
    assert!(verification.failed());
    let failed = verification.failed_dimensions();
    assert!(failed.contains(&"latency_p95_ms"));
    assert!(failed.contains(&"error_rate"));

    // Exactly one inverse, restoring the pre-operation replica count.
    let undone = gateway.rolled_back();
    assert_eq!(undone.len(), 1);
    assert_eq!(undone[0].1, RollbackOp::RestoreReplicas { replicas: 2 });
    let record = entry.rollback.as_ref().unwrap();
    assert!(record.succeeded);
    assert!(record.final_state.as_ref().unwrap().passed());

    // The original operation is the breaker failure, not the undo.
    let status = governor.breaker_status(&target()).unwrap();
    assert_eq!(status.recent_failures, 1);
    Ok(())
}

/// Tenet: when the inverse itself fails, the cycle ends in
/// `rollback_failed` with an escalation a human can act on, raised
/// at critical severity.
#[tokio::test(start_paused = true)]
async fn rollback_failure_escalates_critically() -> anyhow::Result<()> {
    init_tracing();
    let metrics = Arc::new(SequenceMetrics::new(vec![
        Ok(hot_snapshot(&target(), t0())),
        Ok(degraded_snapshot(&target(), t0())),
    ]));
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.script_rollback(Err(ExecutionError::Unreachable(
        "cluster api down".to_string(),
    )));
    let alerts = Arc::new(CollectingAlertSink::new());
    let governor =
        Governor::new(metrics, Arc::clone(&gateway) as _).with_alert_sink(Arc::clone(&alerts) as _);
    governor.load_policy(target(), canonical_policy())?;

    let entry = governor.run_cycle(&target()).await?;

    let escalation = match &entry.outcome {
        CycleOutcome::RollbackFailed { escalation } => escalation,
        other => panic!("expected RollbackFailed, got {other:?}"),
    };
    assert!(entry.outcome.requires_human());
    assert!(!escalation.suggested_next_steps.is_empty());
    let record = entry.rollback.as_ref().unwrap();
    assert!(!record.succeeded);

    let critical: Vec<_> = alerts
        .alerts()
        .into_iter()
        .filter(|alert| alert.severity == AlertSeverity::Critical)
        .collect();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].title, "rollback failed");
    Ok(())
}

/// Tenet: three failures inside the window open the breaker; the
/// fourth cycle is classified forbidden with `circuit_breaker_open`
/// and never reaches the gateway.
#[tokio::test(start_paused = true)]
async fn breaker_opens_after_three_failures_and_blocks_the_fourth() -> anyhow::Result<()> {
    init_tracing();
    let metrics = Arc::new(StaticMetrics::new(hot_snapshot(&target(), t0())));
    let gateway = Arc::new(ScriptedGateway::new());
    for _ in 0..3 {
        gateway.script_execute(Err(ExecutionError::Unreachable("api down".to_string())));
    }
    let alerts = Arc::new(CollectingAlertSink::new());
    let governor =
        Governor::new(metrics, Arc::clone(&gateway) as _).with_alert_sink(Arc::clone(&alerts) as _);
    governor.load_policy(target(), rapid_policy())?;

    for _ in 0..3 {
        let entry = governor.run_cycle(&target()).await?;
        assert!(matches!(entry.outcome, CycleOutcome::ExecutionFailed { .. }));
    }

    let fourth = governor.run_cycle(&target()).await?;
    match &fourth.outcome {
        CycleOutcome::Blocked { reason } => assert_eq!(reason, "circuit_breaker_open"),
        other => panic!("expected Blocked, got {other:?}"),
    }
    assert!(fourth.verdict.is_forbidden());
    assert_eq!(gateway.executed().len(), 3);

    // The open transition raised a critical alert and an audit record.
    assert!(alerts
        .alerts()
        .iter()
        .any(|alert| alert.title == "circuit breaker opened"));
    assert!(governor
        .audit_log()
        .entries()
        .iter()
        .any(|sealed| matches!(&sealed.record, AuditRecord::Breaker { .. })));
    governor.audit_log().verify_integrity()?;
    Ok(())
}

/// Tenet: a manual reset closes the breaker immediately, is audited,
/// and the next cycle executes again.
#[tokio::test(start_paused = true)]
async fn manual_reset_reopens_the_path() -> anyhow::Result<()> {
    init_tracing();
    let metrics = Arc::new(StaticMetrics::new(hot_snapshot(&target(), t0())));
    let gateway = Arc::new(ScriptedGateway::new());
    for _ in 0..3 {
        gateway.script_execute(Err(ExecutionError::Unreachable("api down".to_string())));
    }
    let governor = Governor::new(metrics, Arc::clone(&gateway) as _);
    governor.load_policy(target(), rapid_policy())?;

    for _ in 0..3 {
        governor.run_cycle(&target()).await?;
    }
    assert!(matches!(
        governor.run_cycle(&target()).await?.outcome,
        CycleOutcome::Blocked { .. }
    ));

    governor.reset_breaker(&target()).await?;

    let after = governor.run_cycle(&target()).await?;
    assert_eq!(after.outcome, CycleOutcome::Completed);
    let executed = gateway.executed();
    assert_eq!(executed.len(), 4);
    assert!(matches!(
        executed.last().map(|command| &command.action),
        Some(DecisionAction::ScaleUp { .. })
    ));
    Ok(())
}
