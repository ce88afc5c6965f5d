//! Approval queue
//!
//! Restricted decisions are parked here instead of executing. A
//! request stays visibly pending until a human approves or denies it,
//! or until its policy-defined timeout expires; expiry is swept by
//! the governor, never silent.

use aog_decision::Decision;
use aog_policy::TargetId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Identity of one approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalId(Uuid);

impl ApprovalId {
    /// Mint a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApprovalId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ApprovalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of an approval request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    /// Waiting for a human
    Pending,
    /// Approved; the operation may proceed
    Approved,
    /// Denied; the operation is dropped
    Denied,
    /// Timed out before anyone responded
    Expired,
}

impl ApprovalState {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::Expired => "expired",
        }
    }
}

impl Display for ApprovalState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One suspended operation awaiting a human
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request identity
    pub id: ApprovalId,
    /// Target the suspended operation applies to
    pub target: TargetId,
    /// The decision awaiting sign-off
    pub decision: Decision,
    /// Why this needs a human, with the restriction spelled out
    pub risk_summary: String,
    /// Channel the request is routed to
    pub approver_channel: String,
    /// Current lifecycle state
    pub state: ApprovalState,
    /// When the request was opened
    pub submitted_at: DateTime<Utc>,
    /// When the request expires if nobody responds
    pub expires_at: DateTime<Utc>,
    /// When a human (or the expiry sweep) resolved it
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// Open a new pending request
    #[must_use]
    pub fn new(
        decision: Decision,
        risk_summary: impl Into<String>,
        approver_channel: impl Into<String>,
        submitted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            target: decision.target.clone(),
            decision,
            risk_summary: risk_summary.into(),
            approver_channel: approver_channel.into(),
            state: ApprovalState::Pending,
            submitted_at,
            expires_at,
            resolved_at: None,
        }
    }

    /// True while the request waits for a human
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == ApprovalState::Pending
    }
}

/// Ways resolving an approval can fail
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ApprovalError {
    /// No request with that id
    #[error("approval request {0} not found")]
    NotFound(ApprovalId),
    /// The request was already resolved
    #[error("approval request {id} already {state}")]
    AlreadyResolved {
        /// Request identity
        id: ApprovalId,
        /// State it was resolved to
        state: ApprovalState,
    },
    /// The request timed out before the resolution arrived
    #[error("approval request {id} expired at {expired_at}")]
    Expired {
        /// Request identity
        id: ApprovalId,
        /// When the timeout passed
        expired_at: DateTime<Utc>,
    },
}

/// Concurrent store of approval requests
#[derive(Debug, Default)]
pub struct ApprovalQueue {
    requests: DashMap<ApprovalId, ApprovalRequest>,
}

impl ApprovalQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a request, returning its id
    pub fn submit(&self, request: ApprovalRequest) -> ApprovalId {
        let id = request.id;
        self.requests.insert(id, request);
        id
    }

    /// Look up a request by id
    #[must_use]
    pub fn get(&self, id: &ApprovalId) -> Option<ApprovalRequest> {
        self.requests.get(id).map(|r| r.clone())
    }

    /// All requests still waiting, oldest first
    #[must_use]
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        let mut pending: Vec<ApprovalRequest> = self
            .requests
            .iter()
            .filter(|r| r.is_pending())
            .map(|r| r.clone())
            .collect();
        pending.sort_by_key(|r| r.submitted_at);
        pending
    }

    /// Approve a pending request
    ///
    /// # Errors
    /// Fails when the request is unknown, already resolved, or past
    /// its expiry (in which case it is marked expired).
    pub fn approve(
        &self,
        id: &ApprovalId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        self.resolve(id, ApprovalState::Approved, now)
    }

    /// Deny a pending request
    ///
    /// # Errors
    /// Same failure modes as [`ApprovalQueue::approve`].
    pub fn deny(
        &self,
        id: &ApprovalId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        self.resolve(id, ApprovalState::Denied, now)
    }

    fn resolve(
        &self,
        id: &ApprovalId,
        state: ApprovalState,
        now: DateTime<Utc>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let mut request = self
            .requests
            .get_mut(id)
            .ok_or(ApprovalError::NotFound(*id))?;
        if !request.is_pending() {
            return Err(ApprovalError::AlreadyResolved {
                id: *id,
                state: request.state,
            });
        }
        if now >= request.expires_at {
            request.state = ApprovalState::Expired;
            request.resolved_at = Some(now);
            return Err(ApprovalError::Expired {
                id: *id,
                expired_at: request.expires_at,
            });
        }
        request.state = state;
        request.resolved_at = Some(now);
        Ok(request.clone())
    }

    /// Flip pending requests past their expiry to expired
    ///
    /// Returns the requests that expired in this sweep.
    pub fn expire_stale(&self, now: DateTime<Utc>) -> Vec<ApprovalRequest> {
        let mut expired = Vec::new();
        for mut entry in self.requests.iter_mut() {
            if entry.is_pending() && now >= entry.expires_at {
                entry.state = ApprovalState::Expired;
                entry.resolved_at = Some(now);
                expired.push(entry.clone());
            }
        }
        expired
    }

    /// Number of requests ever parked (any state)
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// True when nothing was ever parked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aog_decision::DecisionAction;
    use aog_policy::PolicyField;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn request() -> ApprovalRequest {
        let decision = Decision::new(
            TargetId::new("web"),
            DecisionAction::RollbackDeployment,
            "operator-submitted rollback",
            vec![PolicyField::RestrictedActions],
            t0(),
        );
        ApprovalRequest::new(
            decision,
            "action rollback_deployment is in the restricted list",
            "ops-approvals",
            t0(),
            t0() + Duration::hours(1),
        )
    }

    #[test]
    fn submitted_request_is_visibly_pending() {
        let queue = ApprovalQueue::new();
        let id = queue.submit(request());
        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert!(pending[0].is_pending());
    }

    #[test]
    fn approve_resolves_once() {
        let queue = ApprovalQueue::new();
        let id = queue.submit(request());
        let resolved = queue.approve(&id, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(resolved.state, ApprovalState::Approved);
        assert!(resolved.resolved_at.is_some());

        let again = queue.deny(&id, t0() + Duration::minutes(6));
        assert_eq!(
            again,
            Err(ApprovalError::AlreadyResolved {
                id,
                state: ApprovalState::Approved,
            })
        );
    }

    #[test]
    fn resolving_past_expiry_marks_expired() {
        let queue = ApprovalQueue::new();
        let id = queue.submit(request());
        let late = t0() + Duration::hours(2);
        let err = queue.approve(&id, late).unwrap_err();
        assert!(matches!(err, ApprovalError::Expired { .. }));
        assert_eq!(queue.get(&id).unwrap().state, ApprovalState::Expired);
    }

    #[test]
    fn expire_stale_sweeps_only_overdue_pending() {
        let queue = ApprovalQueue::new();
        let overdue = queue.submit(request());
        let mut fresh_request = request();
        fresh_request.expires_at = t0() + Duration::hours(6);
        let fresh = queue.submit(fresh_request);

        let swept = queue.expire_stale(t0() + Duration::hours(2));
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].id, overdue);
        assert!(queue.get(&fresh).unwrap().is_pending());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let queue = ApprovalQueue::new();
        let err = queue.approve(&ApprovalId::new(), t0()).unwrap_err();
        assert!(matches!(err, ApprovalError::NotFound(_)));
    }

    #[test]
    fn request_serde_round_trip() {
        let original = request();
        let json = serde_json::to_string(&original).unwrap();
        let back: ApprovalRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(original, back);
    }
}
