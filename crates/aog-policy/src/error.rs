//! Policy validation errors

use crate::field::PolicyField;

/// Errors raised when a policy fails validation at load time
///
/// The governor refuses to register a target whose policy does not
/// validate; these errors therefore surface at load, never mid-cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// A field holds a value outside its accepted range
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// The offending field
        field: PolicyField,
        /// What was wrong with it, including the observed value
        reason: String,
    },

    /// Metric weights do not sum to 1.0
    #[error("metric weights must sum to 1.0, got {sum:.4}")]
    WeightSum {
        /// The observed sum
        sum: f64,
    },

    /// Scale-down threshold is not below the scale-up threshold
    #[error("scale_down_threshold {down} must be below scale_up_threshold {up}")]
    ThresholdOrder {
        /// Configured scale-down threshold
        down: f64,
        /// Configured scale-up threshold
        up: f64,
    },

    /// Replica bounds are inverted
    #[error("min_replicas {min} exceeds max_replicas {max}")]
    ReplicaBounds {
        /// Configured minimum
        min: u32,
        /// Configured maximum
        max: u32,
    },
}

impl PolicyError {
    /// The policy field this error refers to
    #[must_use]
    pub fn field(&self) -> PolicyField {
        match self {
            Self::InvalidValue { field, .. } => *field,
            Self::WeightSum { .. } => PolicyField::MetricWeights,
            Self::ThresholdOrder { .. } => PolicyField::ScaleDownThreshold,
            Self::ReplicaBounds { .. } => PolicyField::MinReplicas,
        }
    }
}
