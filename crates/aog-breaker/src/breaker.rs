//! The per-target circuit breaker
//!
//! One [`CircuitBreaker`] instance lives for the lifetime of its target
//! and is mutated by every execution outcome. All methods take an
//! explicit `now` so tests control the clock; callers that want wall
//! time pass `Utc::now()` (the registry wrappers do).

use crate::state::{BreakerEvent, BreakerState, FailureRecord};
use aog_policy::{BreakerPolicy, TargetId};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of asking the breaker whether an operation may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionGate {
    /// Breaker closed; operation permitted
    Allowed,
    /// Breaker half-open; this caller holds the single probe slot
    Probe,
    /// Breaker open (or probe outstanding); operation blocked
    Blocked,
}

impl ExecutionGate {
    /// Whether the gate permits execution
    #[inline]
    #[must_use]
    pub fn permits(&self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// Read-only view of breaker state for decision rationale and audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakerStatus {
    /// Current state
    pub state: BreakerState,
    /// Failures currently inside the window
    pub recent_failures: u32,
    /// When the breaker opened, if it is open
    pub opened_at: Option<DateTime<Utc>>,
}

/// Per-target three-state interlock
///
/// Tracks timestamped failures inside a sliding window; trips open at the
/// policy threshold; allows a single probe after the reset timeout.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    target: TargetId,
    policy: BreakerPolicy,
    state: BreakerState,
    failures: Vec<FailureRecord>,
    opened_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    /// Create a closed breaker for a target
    #[must_use]
    pub fn new(target: TargetId, policy: BreakerPolicy) -> Self {
        Self {
            target,
            policy,
            state: BreakerState::Closed,
            failures: Vec::new(),
            opened_at: None,
        }
    }

    /// The target this breaker guards
    #[inline]
    #[must_use]
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Failures currently inside the window
    #[inline]
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Snapshot of state for rationale and audit
    #[must_use]
    pub fn status(&self) -> BreakerStatus {
        BreakerStatus {
            state: self.state,
            recent_failures: u32::try_from(self.failures.len()).unwrap_or(u32::MAX),
            opened_at: self.opened_at,
        }
    }

    /// Swap the tuning without touching state or history
    ///
    /// Used when a policy is replaced mid-lifetime; breaker state survives
    /// policy reloads.
    pub fn update_policy(&mut self, policy: BreakerPolicy) {
        self.policy = policy;
    }

    /// Ask whether an operation may execute at `now`
    ///
    /// An open breaker whose reset timeout has elapsed transitions to
    /// half-open on this call and grants the caller the one probe slot;
    /// the accompanying event must reach the audit sink.
    pub fn can_execute(&mut self, now: DateTime<Utc>) -> (ExecutionGate, Option<BreakerEvent>) {
        match self.state {
            BreakerState::Closed => {
                self.prune(now);
                (ExecutionGate::Allowed, None)
            }
            BreakerState::Open => {
                let opened_at = self.opened_at.unwrap_or(now);
                if now - opened_at < self.reset_timeout() {
                    (ExecutionGate::Blocked, None)
                } else {
                    self.state = BreakerState::HalfOpen;
                    let event = BreakerEvent::ProbeArmed {
                        target: self.target.clone(),
                        at: now,
                    };
                    tracing::info!(target_id = %self.target, "breaker probe armed");
                    (ExecutionGate::Probe, Some(event))
                }
            }
            // The single probe slot is already taken.
            BreakerState::HalfOpen => (ExecutionGate::Blocked, None),
        }
    }

    /// Preview the gate at `now` without arming the probe
    ///
    /// Decisions that will never execute still need the open/closed
    /// answer for their verdict; this must not consume the half-open
    /// probe slot, so no state changes here.
    #[must_use]
    pub fn peek(&self, now: DateTime<Utc>) -> ExecutionGate {
        match self.state {
            BreakerState::Closed => ExecutionGate::Allowed,
            BreakerState::Open => {
                let opened_at = self.opened_at.unwrap_or(now);
                if now - opened_at < self.reset_timeout() {
                    ExecutionGate::Blocked
                } else {
                    ExecutionGate::Probe
                }
            }
            BreakerState::HalfOpen => ExecutionGate::Blocked,
        }
    }

    /// Record a failed execution outcome
    ///
    /// Closed: appends to the window and trips open at the threshold.
    /// Half-open: the probe failed; reopen with a fresh timeout.
    pub fn record_failure(
        &mut self,
        now: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Option<BreakerEvent> {
        let reason = reason.into();
        match self.state {
            BreakerState::Closed => {
                self.failures.push(FailureRecord { at: now, reason });
                self.prune(now);
                if self.failures.len() >= self.policy.failure_threshold as usize {
                    self.state = BreakerState::Open;
                    self.opened_at = Some(now);
                    let event = BreakerEvent::Opened {
                        target: self.target.clone(),
                        at: now,
                        failures: self.failures.clone(),
                    };
                    tracing::warn!(
                        target_id = %self.target,
                        failures = self.failures.len(),
                        threshold = self.policy.failure_threshold,
                        "breaker opened"
                    );
                    Some(event)
                } else {
                    None
                }
            }
            BreakerState::HalfOpen => {
                self.failures.push(FailureRecord {
                    at: now,
                    reason: reason.clone(),
                });
                self.state = BreakerState::Open;
                self.opened_at = Some(now);
                tracing::warn!(target_id = %self.target, %reason, "breaker probe failed, reopened");
                Some(BreakerEvent::Reopened {
                    target: self.target.clone(),
                    at: now,
                    reason,
                })
            }
            // Late failure report from before the trip; keep it in history.
            BreakerState::Open => {
                self.failures.push(FailureRecord { at: now, reason });
                None
            }
        }
    }

    /// Record a successful execution outcome
    ///
    /// Half-open: the probe succeeded; close and clear history.
    pub fn record_success(&mut self, now: DateTime<Utc>) -> Option<BreakerEvent> {
        match self.state {
            BreakerState::HalfOpen => {
                self.state = BreakerState::Closed;
                self.failures.clear();
                self.opened_at = None;
                tracing::info!(target_id = %self.target, "breaker closed after successful probe");
                Some(BreakerEvent::Closed {
                    target: self.target.clone(),
                    at: now,
                })
            }
            BreakerState::Closed => {
                self.prune(now);
                None
            }
            // A success cannot close an open breaker; only the probe can.
            BreakerState::Open => None,
        }
    }

    /// Operator-forced reset to closed, clearing history
    ///
    /// The only way to recover from an unresolved open state before the
    /// timeout; always emits its own distinct event.
    pub fn manual_reset(&mut self, now: DateTime<Utc>) -> BreakerEvent {
        let previous = self.state;
        self.state = BreakerState::Closed;
        self.failures.clear();
        self.opened_at = None;
        tracing::info!(target_id = %self.target, %previous, "breaker manually reset");
        BreakerEvent::ManualReset {
            target: self.target.clone(),
            at: now,
            previous,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let window = self.failure_window();
        self.failures.retain(|f| now - f.at <= window);
    }

    fn failure_window(&self) -> ChronoDuration {
        ChronoDuration::seconds(i64::try_from(self.policy.failure_window_secs).unwrap_or(i64::MAX))
    }

    fn reset_timeout(&self) -> ChronoDuration {
        ChronoDuration::seconds(i64::try_from(self.policy.reset_timeout_secs).unwrap_or(i64::MAX))
    }
}
