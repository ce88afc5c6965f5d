//! AOG Circuit Breaker
//!
//! Per-target safety interlock for the decision core.
//!
//! # Core Concepts
//!
//! - [`BreakerState`]: `closed` / `open` / `half_open`
//! - [`CircuitBreaker`]: the per-target state machine; explicit `now`
//!   parameters keep it deterministic under test
//! - [`ExecutionGate`]: what a cycle gets when it asks to proceed,
//!   including the one-shot half-open probe
//! - [`BreakerEvent`]: typed transitions for the audit trail; manual
//!   resets are their own variant
//! - [`BreakerRegistry`]: locked breaker handles keyed by target
//!
//! # Example
//!
//! ```rust,ignore
//! use aog_breaker::{BreakerRegistry, ExecutionGate};
//!
//! let handle = registry.handle(&target, &policy.breaker);
//! let (gate, event) = handle.lock().can_execute(Utc::now());
//! if gate.permits() {
//!     // run the operation, then record_success / record_failure
//! }
//! ```

#![warn(unreachable_pub)]

mod breaker;
mod registry;
mod state;

pub use breaker::{BreakerStatus, CircuitBreaker, ExecutionGate};
pub use registry::{BreakerHandle, BreakerRegistry};
pub use state::{
    allowed_transitions, validate_transition, BreakerEvent, BreakerState, FailureRecord,
    TransitionError,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
