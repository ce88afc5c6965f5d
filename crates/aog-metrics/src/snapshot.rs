//! Point-in-time metric snapshots
//!
//! A [`MetricSnapshot`] carries one sampling of a target's live readings.
//! Every field is optional: an absent reading is `None`, never zero, so
//! downstream rules can distinguish "no data" from "measured zero".
//! Snapshots are created each cycle, never mutated, and discarded after
//! use; persistence belongs to the audit sink.

use aog_policy::TargetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sampling of a target's live metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Target the readings belong to
    pub target: TargetId,
    /// Wall-clock sampling time
    pub taken_at: DateTime<Utc>,
    /// CPU usage as a fraction of the current request
    pub cpu_utilization: Option<f64>,
    /// Memory usage as a fraction of the current request
    pub memory_utilization: Option<f64>,
    /// Raw CPU usage in millicores
    pub cpu_usage_millis: Option<f64>,
    /// Current CPU request in millicores
    pub cpu_request_millis: Option<f64>,
    /// Raw memory usage in MiB
    pub memory_usage_mib: Option<f64>,
    /// Current memory request in MiB
    pub memory_request_mib: Option<f64>,
    /// 95th percentile request latency in milliseconds
    pub latency_p95_ms: Option<f64>,
    /// Failed-request fraction over the sampling window
    pub error_rate: Option<f64>,
    /// Ready replica count
    pub replicas: Option<u32>,
    /// Container restarts observed for the worst instance
    pub restart_count: Option<u32>,
    /// Fraction of instances passing readiness
    pub availability: Option<f64>,
    /// Whether every pod currently reports healthy
    pub all_pods_healthy: Option<bool>,
}

/// The readings the scaling rule needs, all present and finite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingReadings {
    /// CPU utilization fraction
    pub cpu_utilization: f64,
    /// Memory utilization fraction
    pub memory_utilization: f64,
    /// Latency p95 in milliseconds
    pub latency_p95_ms: f64,
    /// Current replica count
    pub replicas: u32,
}

/// A usage/request pair for one resource, both present and finite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceReadings {
    /// Observed usage (millicores or MiB)
    pub usage: f64,
    /// Configured request (millicores or MiB)
    pub request: f64,
}

impl ResourceReadings {
    /// Usage as a fraction of the request
    #[inline]
    #[must_use]
    pub fn utilization(&self) -> f64 {
        self.usage / self.request
    }
}

/// Drop values that are not finite; absent and NaN/inf read the same downstream.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl MetricSnapshot {
    /// Create an empty snapshot for a target, stamped now
    #[must_use]
    pub fn new(target: TargetId) -> Self {
        Self::at(target, Utc::now())
    }

    /// Create an empty snapshot with an explicit sampling time
    #[must_use]
    pub fn at(target: TargetId, taken_at: DateTime<Utc>) -> Self {
        Self {
            target,
            taken_at,
            cpu_utilization: None,
            memory_utilization: None,
            cpu_usage_millis: None,
            cpu_request_millis: None,
            memory_usage_mib: None,
            memory_request_mib: None,
            latency_p95_ms: None,
            error_rate: None,
            replicas: None,
            restart_count: None,
            availability: None,
            all_pods_healthy: None,
        }
    }

    /// Set CPU utilization
    #[must_use]
    pub fn with_cpu_utilization(mut self, fraction: f64) -> Self {
        self.cpu_utilization = Some(fraction);
        self
    }

    /// Set memory utilization
    #[must_use]
    pub fn with_memory_utilization(mut self, fraction: f64) -> Self {
        self.memory_utilization = Some(fraction);
        self
    }

    /// Set the raw CPU usage/request pair in millicores
    #[must_use]
    pub fn with_cpu_millis(mut self, usage: f64, request: f64) -> Self {
        self.cpu_usage_millis = Some(usage);
        self.cpu_request_millis = Some(request);
        self
    }

    /// Set the raw memory usage/request pair in MiB
    #[must_use]
    pub fn with_memory_mib(mut self, usage: f64, request: f64) -> Self {
        self.memory_usage_mib = Some(usage);
        self.memory_request_mib = Some(request);
        self
    }

    /// Set latency p95 in milliseconds
    #[must_use]
    pub fn with_latency_p95_ms(mut self, latency: f64) -> Self {
        self.latency_p95_ms = Some(latency);
        self
    }

    /// Set the error rate fraction
    #[must_use]
    pub fn with_error_rate(mut self, rate: f64) -> Self {
        self.error_rate = Some(rate);
        self
    }

    /// Set the ready replica count
    #[must_use]
    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    /// Set the restart count
    #[must_use]
    pub fn with_restart_count(mut self, restarts: u32) -> Self {
        self.restart_count = Some(restarts);
        self
    }

    /// Set the availability fraction
    #[must_use]
    pub fn with_availability(mut self, fraction: f64) -> Self {
        self.availability = Some(fraction);
        self
    }

    /// Set the all-pods-healthy flag
    #[must_use]
    pub fn with_all_pods_healthy(mut self, healthy: bool) -> Self {
        self.all_pods_healthy = Some(healthy);
        self
    }

    /// The readings the scaling rule requires, if all are present and finite
    #[must_use]
    pub fn scaling_readings(&self) -> Option<ScalingReadings> {
        Some(ScalingReadings {
            cpu_utilization: finite(self.cpu_utilization)?,
            memory_utilization: finite(self.memory_utilization)?,
            latency_p95_ms: finite(self.latency_p95_ms)?,
            replicas: self.replicas?,
        })
    }

    /// CPU usage/request, if both are present, finite, and request is positive
    #[must_use]
    pub fn cpu_readings(&self) -> Option<ResourceReadings> {
        let usage = finite(self.cpu_usage_millis)?;
        let request = finite(self.cpu_request_millis).filter(|r| *r > 0.0)?;
        Some(ResourceReadings { usage, request })
    }

    /// Memory usage/request, if both are present, finite, and request is positive
    #[must_use]
    pub fn memory_readings(&self) -> Option<ResourceReadings> {
        let usage = finite(self.memory_usage_mib)?;
        let request = finite(self.memory_request_mib).filter(|r| *r > 0.0)?;
        Some(ResourceReadings { usage, request })
    }

    /// Whether the snapshot shows instance distress worth a recovery decision
    #[inline]
    #[must_use]
    pub fn is_distressed(&self) -> bool {
        self.restart_count.is_some_and(|c| c > 0) || self.all_pods_healthy == Some(false)
    }

    /// Names of the scaling-rule fields that are absent or non-finite
    ///
    /// Used to build the `metrics_unavailable` rationale.
    #[must_use]
    pub fn missing_scaling_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if finite(self.cpu_utilization).is_none() {
            missing.push("cpu_utilization");
        }
        if finite(self.memory_utilization).is_none() {
            missing.push("memory_utilization");
        }
        if finite(self.latency_p95_ms).is_none() {
            missing.push("latency_p95_ms");
        }
        if self.replicas.is_none() {
            missing.push("replicas");
        }
        missing
    }
}
