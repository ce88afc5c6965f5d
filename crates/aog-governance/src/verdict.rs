//! Governance verdicts
//!
//! A [`GovernanceVerdict`] is the enforcer's answer for one decision:
//! `allowed` proceeds to execution, `restricted` parks behind a human
//! approval, `forbidden` never executes. Restricted verdicts always
//! carry the approval request they opened; the constructors make the
//! pairing impossible to forget.

use crate::approval::ApprovalId;
use aog_policy::{ActionKind, PolicyField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Verdict reason when the breaker gate blocks execution
pub const REASON_CIRCUIT_BREAKER_OPEN: &str = "circuit_breaker_open";

/// Verdict reason when the hourly operation budget is exhausted
pub const REASON_RATE_LIMIT_EXCEEDED: &str = "rate_limit_exceeded";

/// The three governance tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceTier {
    /// Auto-execute immediately
    Allowed,
    /// Suspend pending human approval
    Restricted,
    /// Never auto-execute
    Forbidden,
}

impl GovernanceTier {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Restricted => "restricted",
            Self::Forbidden => "forbidden",
        }
    }
}

impl Display for GovernanceTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The enforcer's classification of one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceVerdict {
    /// Which tier the decision landed in
    pub tier: GovernanceTier,
    /// Why, with the triggering values spelled out
    pub reason: String,
    /// Policy fields that drove the classification
    pub policy_refs: Vec<PolicyField>,
    /// The approval request opened for a restricted decision
    pub approval_ref: Option<ApprovalId>,
    /// Safer follow-ups suggested when the action is forbidden
    pub suggested_alternatives: Vec<ActionKind>,
    /// When the enforcer classified
    pub decided_at: DateTime<Utc>,
}

impl GovernanceVerdict {
    /// An `allowed` verdict
    #[must_use]
    pub fn allowed(
        reason: impl Into<String>,
        policy_refs: Vec<PolicyField>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tier: GovernanceTier::Allowed,
            reason: reason.into(),
            policy_refs,
            approval_ref: None,
            suggested_alternatives: Vec::new(),
            decided_at,
        }
    }

    /// A `restricted` verdict, always paired with its approval request
    #[must_use]
    pub fn restricted(
        reason: impl Into<String>,
        policy_refs: Vec<PolicyField>,
        approval_ref: ApprovalId,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tier: GovernanceTier::Restricted,
            reason: reason.into(),
            policy_refs,
            approval_ref: Some(approval_ref),
            suggested_alternatives: Vec::new(),
            decided_at,
        }
    }

    /// A `forbidden` verdict
    #[must_use]
    pub fn forbidden(
        reason: impl Into<String>,
        policy_refs: Vec<PolicyField>,
        suggested_alternatives: Vec<ActionKind>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tier: GovernanceTier::Forbidden,
            reason: reason.into(),
            policy_refs,
            approval_ref: None,
            suggested_alternatives,
            decided_at,
        }
    }

    /// True when the decision may execute immediately
    #[inline]
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.tier == GovernanceTier::Allowed
    }

    /// True when the decision is parked behind an approval
    #[inline]
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.tier == GovernanceTier::Restricted
    }

    /// True when the decision is blocked outright
    #[inline]
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.tier == GovernanceTier::Forbidden
    }
}
