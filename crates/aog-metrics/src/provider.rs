//! Metrics provider seam
//!
//! The collection pipeline lives outside this core; cycles reach it
//! through [`MetricsProvider`]. A provider failure is not fatal to the
//! control loop; the cycle degrades to a no-action decision.

use crate::snapshot::MetricSnapshot;
use aog_policy::TargetId;

/// Async source of metric snapshots
#[async_trait::async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Sample current readings for one target
    ///
    /// # Errors
    /// Returns [`MetricsError`] when the pipeline cannot produce a snapshot;
    /// partial data is returned as a snapshot with absent fields instead.
    async fn sample(&self, target: &TargetId) -> Result<MetricSnapshot, MetricsError>;
}

/// Errors from the metrics pipeline
#[derive(Debug, Clone, thiserror::Error)]
pub enum MetricsError {
    /// The pipeline has no data for this target
    #[error("no metrics for target {0}: {1}")]
    NoData(TargetId, String),

    /// The pipeline itself could not be reached
    #[error("metrics pipeline unreachable: {0}")]
    Unreachable(String),
}
