//! AOG Decision Engine
//!
//! Pure evaluation of metric snapshots into typed, justified decisions,
//! plus the execution-gateway seam those decisions eventually cross.
//!
//! # Core Concepts
//!
//! - [`DecisionAction`]: closed sum type over the operation vocabulary;
//!   every variant carries exactly the parameters its kind needs
//! - [`Decision`]: an action plus the rationale and policy references
//!   that let an audit reader reproduce the arithmetic
//! - [`decide`]: the engine itself, a pure function of one snapshot,
//!   one policy, and the breaker view; no I/O, no shared state
//! - [`ExecutionGateway`]: async seam to whatever applies changes to
//!   the managed system
//!
//! Gating is deliberately absent here. The engine always reports what
//! it would do; the governance enforcer decides whether it may.
//!
//! # Example
//!
//! ```rust,ignore
//! use aog_decision::{decide, DecisionContext};
//!
//! let decision = decide(&DecisionContext {
//!     snapshot: &snapshot,
//!     policy: &policy,
//!     breaker: &breaker_status,
//!     elapsed_since_last_attempt: None,
//!     now: chrono::Utc::now(),
//! });
//! println!("{}: {}", decision.action, decision.rationale);
//! ```

#![warn(unreachable_pub)]

mod action;
mod command;
mod decision;
mod engine;

pub use action::{DecisionAction, NoActionReason, ResourceKind, ResourceRecommendation};
pub use command::{
    ExecutionCommand, ExecutionError, ExecutionGateway, ExecutionResult, PriorState, RollbackOp,
};
pub use decision::Decision;
pub use engine::{decide, weighted_utilization, DecisionContext, APPROVAL_ESCALATION_DELTA};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
