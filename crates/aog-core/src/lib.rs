//! AOG Core: the governor that ties the control loop together
//!
//! Everything below this crate is a building block; this crate is the
//! machine. A [`Governor`] holds the registered targets, runs the
//! sample / decide / enforce / execute / verify cycle for each of
//! them, feeds outcomes back into the circuit breakers, answers
//! operator calls (approvals, breaker resets, policy changes), and
//! seals every operation into a hash-chained audit log.
//!
//! # Core Concepts
//!
//! - [`Governor`]: owns per-target state and drives cycles; one cycle
//!   per target at a time, targets independent of each other
//! - [`CycleOutcome`]: the one-word summary of how a cycle ended,
//!   from `no_action` through `rollback_failed`
//! - [`AuditRecord`] / [`MemoryAuditLog`]: append-only hash-chained
//!   trail of operations, breaker transitions and approval
//!   resolutions
//! - [`Alert`] / [`AlertSink`]: out-of-band notifications for the
//!   conditions that need human eyes
//!
//! # Example
//!
//! ```rust,ignore
//! use aog_core::{Governor, GovernorConfig};
//! use aog_policy::{Policy, TargetId};
//! use std::sync::Arc;
//!
//! let governor = Governor::new(metrics, gateway);
//! governor.load_policy(TargetId::new("web-frontend"), Policy::default())?;
//!
//! let entry = governor.run_cycle(&TargetId::new("web-frontend")).await?;
//! println!("cycle ended: {}", entry.outcome);
//! governor.audit_log().verify_integrity()?;
//! ```

#![warn(unreachable_pub)]

mod alert;
mod audit;
mod config;
mod cycle;
mod error;
mod governor;

pub use alert::{Alert, AlertSeverity, AlertSink, TracingAlertSink};
pub use audit::{
    AuditEntry, AuditError, AuditRecord, AuditSink, JsonlAuditSink, MemoryAuditLog, OperationId,
    SealedRecord, StageTimestamps,
};
pub use config::GovernorConfig;
pub use cycle::CycleOutcome;
pub use error::{Escalation, GovernorError};
pub use governor::{ApprovalOutcome, ApprovalResolution, Governor, RunReport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
