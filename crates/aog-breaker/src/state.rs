//! Breaker states, transition rules, and audit events
//!
//! The three-state interlock: `closed` (operations permitted), `open`
//! (operations blocked), `half_open` (exactly one probe permitted).
//! Transitions are driven by execution outcomes and the reset timeout;
//! [`validate_transition`] encodes the legal edges so tests and audit
//! consumers can reject impossible histories.

use aog_policy::TargetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Current position of the interlock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    /// Operations permitted; failures are being counted
    Closed,
    /// Operations blocked until the reset timeout or a manual reset
    Open,
    /// One probe operation outstanding
    HalfOpen,
}

impl BreakerState {
    /// Stable snake_case name for rationale and audit records
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl Display for BreakerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timestamped execution failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// When the failure was recorded
    pub at: DateTime<Utc>,
    /// Short reason, carried into the open-transition audit event
    pub reason: String,
}

/// Typed breaker transition, emitted for audit and alerting
///
/// A manual reset is a distinct variant so operators' interventions are
/// never mistaken for automatic transitions in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BreakerEvent {
    /// Failure threshold reached; operations now blocked
    Opened {
        /// Target whose breaker tripped
        target: TargetId,
        /// Transition time
        at: DateTime<Utc>,
        /// The failures inside the window that tripped the breaker
        failures: Vec<FailureRecord>,
    },
    /// Reset timeout elapsed; a single probe was granted
    ProbeArmed {
        /// Target whose breaker armed a probe
        target: TargetId,
        /// Transition time
        at: DateTime<Utc>,
    },
    /// Probe succeeded; failure history cleared
    Closed {
        /// Target whose breaker closed
        target: TargetId,
        /// Transition time
        at: DateTime<Utc>,
    },
    /// Probe failed; blocking resumed with a fresh timeout
    Reopened {
        /// Target whose breaker reopened
        target: TargetId,
        /// Transition time
        at: DateTime<Utc>,
        /// Why the probe failed
        reason: String,
    },
    /// Operator forced the breaker closed
    ManualReset {
        /// Target whose breaker was reset
        target: TargetId,
        /// Reset time
        at: DateTime<Utc>,
        /// State the breaker was in before the reset
        previous: BreakerState,
    },
}

impl BreakerEvent {
    /// The state this event lands in
    #[must_use]
    pub fn new_state(&self) -> BreakerState {
        match self {
            Self::Opened { .. } | Self::Reopened { .. } => BreakerState::Open,
            Self::ProbeArmed { .. } => BreakerState::HalfOpen,
            Self::Closed { .. } | Self::ManualReset { .. } => BreakerState::Closed,
        }
    }

    /// The target this event belongs to
    #[must_use]
    pub fn target(&self) -> &TargetId {
        match self {
            Self::Opened { target, .. }
            | Self::ProbeArmed { target, .. }
            | Self::Closed { target, .. }
            | Self::Reopened { target, .. }
            | Self::ManualReset { target, .. } => target,
        }
    }
}

/// Error for an illegal breaker transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid breaker transition: {from} -> {to}")]
pub struct TransitionError {
    /// State transitioned from
    pub from: BreakerState,
    /// State transitioned to
    pub to: BreakerState,
}

/// Check a single transition against the legal edges
///
/// Manual reset edges (any state to `closed`) are legal by definition.
///
/// # Errors
/// Returns [`TransitionError`] when the edge is not part of the machine.
pub fn validate_transition(from: BreakerState, to: BreakerState) -> Result<(), TransitionError> {
    use BreakerState::{Closed, HalfOpen, Open};
    match (from, to) {
        // Threshold trip and probe failure
        (Closed | HalfOpen, Open)
        // Timeout elapsed
        | (Open, HalfOpen)
        // Probe success and manual reset
        | (HalfOpen | Open | Closed, Closed) => Ok(()),
        _ => Err(TransitionError { from, to }),
    }
}

/// States reachable from `from` in one legal transition
#[must_use]
pub fn allowed_transitions(from: BreakerState) -> Vec<BreakerState> {
    use BreakerState::{Closed, HalfOpen, Open};
    match from {
        Closed => vec![Open, Closed],
        Open => vec![HalfOpen, Closed],
        HalfOpen => vec![Open, Closed],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_are_snake_case() {
        assert_eq!(BreakerState::Closed.as_str(), "closed");
        assert_eq!(BreakerState::HalfOpen.to_string(), "half_open");
    }

    #[test]
    fn legal_transitions_accepted() {
        assert!(validate_transition(BreakerState::Closed, BreakerState::Open).is_ok());
        assert!(validate_transition(BreakerState::Open, BreakerState::HalfOpen).is_ok());
        assert!(validate_transition(BreakerState::HalfOpen, BreakerState::Open).is_ok());
        assert!(validate_transition(BreakerState::HalfOpen, BreakerState::Closed).is_ok());
    }

    #[test]
    fn closed_to_half_open_rejected() {
        let err = validate_transition(BreakerState::Closed, BreakerState::HalfOpen).unwrap_err();
        assert_eq!(err.from, BreakerState::Closed);
        assert_eq!(err.to, BreakerState::HalfOpen);
    }

    #[test]
    fn allowed_transitions_match_validate() {
        for from in [BreakerState::Closed, BreakerState::Open, BreakerState::HalfOpen] {
            for to in allowed_transitions(from) {
                assert!(validate_transition(from, to).is_ok());
            }
        }
    }

    #[test]
    fn event_new_state() {
        let target = TargetId::new("web");
        let event = BreakerEvent::ProbeArmed {
            target: target.clone(),
            at: Utc::now(),
        };
        assert_eq!(event.new_state(), BreakerState::HalfOpen);
        assert_eq!(event.target(), &target);
    }

    #[test]
    fn event_serde_is_tagged() {
        let event = BreakerEvent::ManualReset {
            target: TargetId::new("web"),
            at: Utc::now(),
            previous: BreakerState::Open,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"manual_reset\""));
        assert!(json.contains("\"previous\":\"open\""));
    }
}
