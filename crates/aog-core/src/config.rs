//! Runtime configuration for the governor
//!
//! Knobs that belong to the runtime, not to any one target's policy.
//! Per-target behavior (thresholds, budgets, stabilization) lives in
//! [`aog_policy::Policy`]; these settings shape how the governor itself
//! runs regardless of which targets are loaded.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Governor runtime knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Hard deadline for one gateway execute call, in seconds
    pub gateway_timeout_secs: u64,
    /// When set, overrides every policy's stabilization wait
    ///
    /// Test and staging environments wind this down instead of editing
    /// each policy.
    pub stabilization_override_secs: Option<u64>,
    /// How often the background sweeper expires stale approvals, in
    /// seconds
    pub approval_sweep_interval_secs: u64,
    /// How many records the embedded audit log retains
    pub audit_buffer_size: usize,
}

impl GovernorConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a gateway deadline
    #[inline]
    #[must_use]
    pub fn with_gateway_timeout(mut self, secs: u64) -> Self {
        self.gateway_timeout_secs = secs;
        self
    }

    /// With a global stabilization override
    #[inline]
    #[must_use]
    pub fn with_stabilization_override(mut self, secs: u64) -> Self {
        self.stabilization_override_secs = Some(secs);
        self
    }

    /// With an approval sweep interval
    #[inline]
    #[must_use]
    pub fn with_approval_sweep_interval(mut self, secs: u64) -> Self {
        self.approval_sweep_interval_secs = secs;
        self
    }

    /// With an audit retention cap
    #[inline]
    #[must_use]
    pub fn with_audit_buffer_size(mut self, records: usize) -> Self {
        self.audit_buffer_size = records;
        self
    }

    /// Gateway deadline as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    /// Sweep interval as a [`Duration`]
    #[inline]
    #[must_use]
    pub fn approval_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.approval_sweep_interval_secs)
    }

    /// The stabilization wait to use for a policy's configured wait
    #[inline]
    #[must_use]
    pub fn stabilization_for(&self, policy_wait: Duration) -> Duration {
        self.stabilization_override_secs
            .map_or(policy_wait, Duration::from_secs)
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            gateway_timeout_secs: 30,
            stabilization_override_secs: None,
            approval_sweep_interval_secs: 60,
            audit_buffer_size: 4096,
        }
    }
}
