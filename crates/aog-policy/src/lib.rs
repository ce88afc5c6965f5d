//! AOG Policy Model
//!
//! Strongly-typed, validated per-target policies for the decision core.
//!
//! # Core Concepts
//!
//! - [`TargetId`]: identity of one independently governed unit
//! - [`Policy`]: the complete blueprint section for one target, split into
//!   scaling, resource, recovery, breaker, governance, and verification parts
//! - [`ActionKind`]: closed vocabulary of operation kinds governance classifies
//! - [`PolicyField`]: named policy fields referenced by decision rationale
//!
//! The blueprint file format itself is out of scope; an external loader
//! deserializes into [`Policy`] (all types are serde-friendly) and the
//! governor validates at registration via [`Policy::validate`].
//!
//! # Example
//!
//! ```rust,ignore
//! use aog_policy::{Policy, ScalingPolicy, TargetId};
//!
//! let policy = Policy::new().with_scaling(ScalingPolicy {
//!     max_replicas: 5,
//!     ..ScalingPolicy::default()
//! });
//! policy.validate()?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod action;
mod error;
mod field;
mod policy;
mod target;

// Re-exports
pub use action::ActionKind;
pub use error::PolicyError;
pub use field::PolicyField;
pub use policy::{
    BreakerPolicy, GovernancePolicy, MetricWeights, Policy, RecoveryPolicy, ResourcePolicy,
    ScalingPolicy, VerificationPolicy,
};
pub use target::{TargetId, TargetIdError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
