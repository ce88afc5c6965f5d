//! AOG Verification and Rollback
//!
//! Closes the loop on executed operations: wait for the system to
//! settle, re-sample it, compare against policy thresholds, and undo
//! the change when the comparison fails.
//!
//! # Core Concepts
//!
//! - [`verify`] / [`VerificationResult`]: pure, idempotent comparison
//!   of one snapshot against the verification thresholds
//! - [`plan_rollback`] / [`InversePlan`]: the fixed inverse table;
//!   every executable action maps to exactly one inverse or an
//!   explicit "no inverse, escalate"
//! - [`VerifyController`]: the async sequence of stabilization wait,
//!   re-sample, and the single rollback attempt
//!
//! Two rules shape everything here: a rollback is attempted at most
//! once per operation, and an in-flight rollback is never cancelled.
//!
//! # Example
//!
//! ```rust,ignore
//! use aog_verify::VerifyController;
//!
//! let controller = VerifyController::new(&metrics, &gateway);
//! let report = controller
//!     .verify_and_recover(&target, &action, &prior, &policy.verification, wait, &mut cancel)
//!     .await;
//! if !report.is_stable() {
//!     eprintln!("degraded: {:?}", report.disposition);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod controller;
mod result;
mod rollback;

pub use controller::{RecoveryDisposition, RecoveryReport, VerifyController};
pub use result::{verify, CheckState, DimensionCheck, HealthCheck, VerificationResult};
pub use rollback::{plan_rollback, InversePlan, RollbackRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
