//! Alert surface
//!
//! Alerts are the push half of observability: conditions an operator
//! should see without polling the audit trail. Three conditions always
//! alert, with fixed severities: a breaker opening (critical), a
//! rollback failure (critical), and a forbidden classification
//! (warning). Sinks are fire-and-forget; alerting must never make a
//! cycle fail.

use crate::error::Escalation;
use aog_policy::TargetId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// How urgently a human should look
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Informational; no action expected
    Info,
    /// Something was prevented; review when convenient
    Warning,
    /// The system is degraded or stuck; act now
    Critical,
}

impl AlertSeverity {
    /// Stable snake_case name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operator-facing notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Urgency
    pub severity: AlertSeverity,
    /// Short, stable headline
    pub title: String,
    /// What happened, with the numbers
    pub message: String,
    /// Target involved, when there is one
    pub target: Option<TargetId>,
    /// Structured context for the receiving system
    pub context: Value,
    /// When the condition was observed
    pub raised_at: DateTime<Utc>,
}

impl Alert {
    /// Build an alert
    #[must_use]
    pub fn new(
        severity: AlertSeverity,
        title: impl Into<String>,
        message: impl Into<String>,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            target: None,
            context: Value::Null,
            raised_at,
        }
    }

    /// Attach the target
    #[must_use]
    pub fn for_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }

    /// Attach structured context
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// The breaker for a target just opened
    #[must_use]
    pub fn breaker_opened(target: TargetId, failures: u32, raised_at: DateTime<Utc>) -> Self {
        Self::new(
            AlertSeverity::Critical,
            "circuit breaker opened",
            format!("breaker for {target} opened after {failures} failures; operations blocked"),
            raised_at,
        )
        .for_target(target)
        .with_context(serde_json::json!({ "recent_failures": failures }))
    }

    /// A rollback failed or had no inverse; the target is degraded
    #[must_use]
    pub fn rollback_failed(
        target: TargetId,
        escalation: &Escalation,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AlertSeverity::Critical,
            "rollback failed",
            escalation.summary.clone(),
            raised_at,
        )
        .for_target(target)
        .with_context(serde_json::to_value(escalation).unwrap_or(Value::Null))
    }

    /// Governance forbade an operation
    #[must_use]
    pub fn forbidden_blocked(
        target: TargetId,
        action: &str,
        reason: &str,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            AlertSeverity::Warning,
            "operation forbidden",
            format!("{action} on {target} blocked: {reason}"),
            raised_at,
        )
        .for_target(target)
        .with_context(serde_json::json!({ "action": action, "reason": reason }))
    }
}

/// Receives alerts; implementations must not block the cycle
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert
    async fn raise(&self, alert: &Alert);
}

/// Emits alerts as tracing events at the matching level
///
/// The default sink: operators who already ship logs get alerts for
/// free, and anything richer can wrap a real pager behind the trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

#[async_trait]
impl AlertSink for TracingAlertSink {
    async fn raise(&self, alert: &Alert) {
        let target = alert
            .target
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        match alert.severity {
            AlertSeverity::Info => {
                tracing::info!(target_id = %target, title = %alert.title, "{}", alert.message);
            }
            AlertSeverity::Warning => {
                tracing::warn!(target_id = %target, title = %alert.title, "{}", alert.message);
            }
            AlertSeverity::Critical => {
                tracing::error!(target_id = %target, title = %alert.title, "{}", alert.message);
            }
        }
    }
}
