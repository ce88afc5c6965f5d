//! AOG Governance Enforcer
//!
//! Policy-driven gatekeeping between a decision and its execution. The
//! enforcer never proposes operations; it classifies what the decision
//! engine already proposed into one of three tiers and leaves the
//! consequences to the caller.
//!
//! # Core Concepts
//!
//! - [`GovernanceVerdict`]: the classification of one decision into
//!   allowed, restricted, or forbidden, with the policy fields that
//!   drove it
//! - [`GovernanceEnforcer`]: ordered checks over a decision; the most
//!   restrictive applicable tier wins
//! - [`ApprovalQueue`]: parking lot for restricted operations awaiting
//!   a human verdict
//! - [`RateLimiter`] / [`CooldownTracker`]: per-target operation
//!   budgets over rolling windows
//!
//! The enforcer consults the circuit breaker before anything else: an
//! open breaker forces `forbidden` no matter how benign the decision.
//!
//! # Example
//!
//! ```rust,ignore
//! use aog_governance::{ApprovalQueue, GovernanceEnforcer};
//! use std::sync::Arc;
//!
//! let enforcer = GovernanceEnforcer::new(Arc::new(ApprovalQueue::new()));
//! let verdict = enforcer.enforce(&decision, &policy, gate, chrono::Utc::now());
//! if verdict.is_forbidden() {
//!     eprintln!("blocked: {}", verdict.reason);
//! }
//! ```

#![warn(unreachable_pub)]

mod approval;
mod cooldown;
mod enforcer;
mod rate_limit;
mod verdict;

pub use approval::{ApprovalError, ApprovalId, ApprovalQueue, ApprovalRequest, ApprovalState};
pub use cooldown::CooldownTracker;
pub use enforcer::GovernanceEnforcer;
pub use rate_limit::RateLimiter;
pub use verdict::{
    GovernanceTier, GovernanceVerdict, REASON_CIRCUIT_BREAKER_OPEN, REASON_RATE_LIMIT_EXCEEDED,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
