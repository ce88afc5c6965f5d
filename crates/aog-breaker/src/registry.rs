//! Breaker registry
//!
//! Owns one locked [`CircuitBreaker`] per target. The lock is the
//! per-target breaker lock, deliberately separate from any cycle guard:
//! manual resets arrive asynchronously from operators and must not wait
//! for an in-flight cycle.

use crate::breaker::CircuitBreaker;
use crate::state::BreakerEvent;
use aog_policy::{BreakerPolicy, TargetId};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared handle to one target's breaker
pub type BreakerHandle = Arc<Mutex<CircuitBreaker>>;

/// All breakers, keyed by target
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<TargetId, BreakerHandle>,
}

impl BreakerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the breaker for a target, creating a closed one on first use
    #[must_use]
    pub fn handle(&self, target: &TargetId, policy: &BreakerPolicy) -> BreakerHandle {
        self.breakers
            .entry(target.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(CircuitBreaker::new(target.clone(), policy.clone())))
            })
            .clone()
    }

    /// Get the breaker for a target if one exists
    #[must_use]
    pub fn get(&self, target: &TargetId) -> Option<BreakerHandle> {
        self.breakers.get(target).map(|entry| entry.clone())
    }

    /// Swap a breaker's tuning in place, preserving its state
    pub fn update_policy(&self, target: &TargetId, policy: &BreakerPolicy) {
        if let Some(handle) = self.get(target) {
            handle.lock().update_policy(policy.clone());
        }
    }

    /// Operator-forced reset; `None` when the target has no breaker
    pub fn manual_reset(&self, target: &TargetId) -> Option<BreakerEvent> {
        let handle = self.get(target)?;
        let event = handle.lock().manual_reset(Utc::now());
        Some(event)
    }

    /// Drop a target's breaker when its policy is withdrawn
    pub fn remove(&self, target: &TargetId) {
        self.breakers.remove(target);
    }

    /// Number of registered breakers
    #[must_use]
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
