//! Target identity
//!
//! Provides [`TargetId`] for naming independently governed units.
//! A target is typically one deployable service; every policy, breaker,
//! cooldown, and decision cycle is keyed by its id.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Maximum accepted id length, matching common workload-name limits.
const MAX_TARGET_ID_LEN: usize = 253;

/// Identifier of one governed target
///
/// Construction via [`TargetId::new`] is unchecked for internal use;
/// parsing external input goes through [`FromStr`], which validates
/// the character set and length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Create a new target id from a raw string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TargetId {
    type Err = TargetIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TargetIdError::Empty);
        }
        if s.len() > MAX_TARGET_ID_LEN {
            return Err(TargetIdError::TooLong(s.len()));
        }
        if s.contains(|c: char| !c.is_ascii_alphanumeric() && c != '-' && c != '_' && c != '.') {
            return Err(TargetIdError::InvalidCharacters(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Errors related to target ids
#[derive(Debug, thiserror::Error)]
pub enum TargetIdError {
    /// Empty id
    #[error("target id must not be empty")]
    Empty,

    /// Id exceeds the length limit
    #[error("target id too long: {0} characters (limit {MAX_TARGET_ID_LEN})")]
    TooLong(usize),

    /// Id contains characters outside the accepted set
    #[error("invalid target id: {0} (must be alphanumeric, '-', '_' or '.')")]
    InvalidCharacters(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_new_and_as_str() {
        let id = TargetId::new("payments-api");
        assert_eq!(id.as_str(), "payments-api");
    }

    #[test]
    fn target_id_display() {
        let id = TargetId::new("web.frontend");
        assert_eq!(id.to_string(), "web.frontend");
    }

    #[test]
    fn target_id_from_str_valid() {
        let id: TargetId = "orders_v2".parse().unwrap();
        assert_eq!(id.as_str(), "orders_v2");
    }

    #[test]
    fn target_id_from_str_empty() {
        let result: Result<TargetId, _> = "".parse();
        assert!(matches!(result, Err(TargetIdError::Empty)));
    }

    #[test]
    fn target_id_from_str_invalid_chars() {
        let result: Result<TargetId, _> = "web frontend".parse();
        assert!(matches!(result, Err(TargetIdError::InvalidCharacters(_))));
    }

    #[test]
    fn target_id_from_str_too_long() {
        let long = "a".repeat(300);
        let result: Result<TargetId, _> = long.parse();
        assert!(matches!(result, Err(TargetIdError::TooLong(300))));
    }
}
