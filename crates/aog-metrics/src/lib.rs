//! AOG Metrics
//!
//! Snapshot types and the provider seam between the decision core and an
//! external metrics-collection pipeline.
//!
//! # Core Concepts
//!
//! - [`MetricSnapshot`]: one point-in-time sampling, every field absent-able
//! - [`ScalingReadings`] / [`ResourceReadings`]: validated views the decision
//!   rules consume (present and finite, or nothing)
//! - [`MetricsProvider`]: async trait implemented by the pipeline adapter

#![warn(unreachable_pub)]

mod provider;
mod snapshot;

pub use provider::{MetricsError, MetricsProvider};
pub use snapshot::{MetricSnapshot, ResourceReadings, ScalingReadings};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
