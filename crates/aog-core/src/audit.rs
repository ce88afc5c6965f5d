//! Audit trail
//!
//! Every cycle outcome, breaker transition, and approval resolution is
//! appended to the audit trail as a typed record. The in-memory log
//! chains records with SHA-256 so after-the-fact edits are detectable;
//! the JSONL sink exports the same records one object per line for
//! external collection. Sinks are additive: a failing sink is logged
//! and skipped, never allowed to stop the control loop.

use crate::cycle::CycleOutcome;
use aog_breaker::BreakerEvent;
use aog_decision::{Decision, ExecutionResult};
use aog_governance::{ApprovalRequest, GovernanceVerdict};
use aog_policy::TargetId;
use aog_verify::{RollbackRecord, VerificationResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use ulid::Ulid;

/// Identity of one control-loop operation, sortable by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Ulid);

impl OperationId {
    /// Generate a fresh id
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Wall-clock timestamps for each stage an operation passed through
///
/// A `None` means the operation never reached that stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimestamps {
    /// Cycle start
    pub started_at: DateTime<Utc>,
    /// Metrics sampled (or the sample failed)
    pub sampled_at: Option<DateTime<Utc>>,
    /// Decision produced
    pub decided_at: Option<DateTime<Utc>>,
    /// Governance verdict produced
    pub enforced_at: Option<DateTime<Utc>>,
    /// Gateway finished executing
    pub executed_at: Option<DateTime<Utc>>,
    /// Post-stabilization verification finished
    pub verified_at: Option<DateTime<Utc>>,
    /// Rollback attempt finished
    pub rolled_back_at: Option<DateTime<Utc>>,
    /// Cycle end, always set
    pub completed_at: Option<DateTime<Utc>>,
}

impl StageTimestamps {
    /// Timestamps for a cycle that just started
    #[must_use]
    pub fn starting(at: DateTime<Utc>) -> Self {
        Self {
            started_at: at,
            sampled_at: None,
            decided_at: None,
            enforced_at: None,
            executed_at: None,
            verified_at: None,
            rolled_back_at: None,
            completed_at: None,
        }
    }
}

/// The durable union of everything one operation produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Operation identity
    pub operation: OperationId,
    /// Target the operation applied to
    pub target: TargetId,
    /// What the engine proposed and why
    pub decision: Decision,
    /// How governance classified it
    pub verdict: GovernanceVerdict,
    /// What the gateway reported, when execution was attempted
    pub execution: Option<ExecutionResult>,
    /// Post-stabilization comparison, when one ran
    pub verification: Option<VerificationResult>,
    /// The rollback attempt, when one was dispatched
    pub rollback: Option<RollbackRecord>,
    /// How the operation ended
    pub outcome: CycleOutcome,
    /// Stage-by-stage wall-clock timestamps
    pub stages: StageTimestamps,
}

/// One appendable audit fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditRecord {
    /// A full control-loop operation
    Operation(Box<AuditEntry>),
    /// A breaker transition or manual reset
    Breaker {
        /// The transition
        event: BreakerEvent,
    },
    /// An approval request leaving the pending state
    Approval {
        /// The resolved request
        request: Box<ApprovalRequest>,
    },
}

impl AuditRecord {
    /// The target this record belongs to
    #[must_use]
    pub fn target(&self) -> &TargetId {
        match self {
            Self::Operation(entry) => &entry.target,
            Self::Breaker { event } => event.target(),
            Self::Approval { request } => &request.target,
        }
    }

    /// Stable snake_case name of the record kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Operation(_) => "operation",
            Self::Breaker { .. } => "breaker",
            Self::Approval { .. } => "approval",
        }
    }
}

/// Ways the audit trail can fail
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The record could not be serialized
    #[error("audit record could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The sink's underlying storage failed
    #[error("audit sink io failure: {0}")]
    Io(#[from] std::io::Error),

    /// The chain does not replay cleanly
    #[error("audit chain integrity violation at sequence {sequence}")]
    IntegrityViolation {
        /// First sequence number that failed to verify
        sequence: u64,
    },
}

/// Receives audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record
    ///
    /// # Errors
    /// Fails when the record cannot be serialized or stored; the
    /// governor logs and continues.
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// A record sealed into the hash chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedRecord {
    /// Position in the chain, starting at zero
    pub sequence: u64,
    /// When the record was appended
    pub recorded_at: DateTime<Utc>,
    /// The record itself
    pub record: AuditRecord,
    /// Hash of the previous record, all-zero for the first
    pub prev_hash: [u8; 32],
    /// Hash over this record and `prev_hash`
    pub hash: [u8; 32],
}

fn compute_hash(sealed: &SealedRecord) -> Result<[u8; 32], AuditError> {
    let payload = serde_json::to_vec(&sealed.record)?;
    let mut hasher = Sha256::new();
    hasher.update(sealed.sequence.to_le_bytes());
    hasher.update(sealed.recorded_at.timestamp_millis().to_le_bytes());
    hasher.update(&payload);
    hasher.update(sealed.prev_hash);
    Ok(hasher.finalize().into())
}

#[derive(Debug)]
struct ChainState {
    records: VecDeque<SealedRecord>,
    /// Hash the next verification walk starts from: all-zero for a
    /// fresh log, the last trimmed record's hash for a capped one
    base_hash: [u8; 32],
    next_sequence: u64,
    capacity: Option<usize>,
}

/// In-memory, hash-chained audit log
///
/// Each appended record carries the hash of its predecessor;
/// [`MemoryAuditLog::verify_integrity`] replays the chain and reports
/// the first sequence that does not hold. A capped log trims its oldest
/// records and re-anchors the walk at the trimmed hash, so verification
/// keeps working over the retained window.
#[derive(Debug)]
pub struct MemoryAuditLog {
    inner: Mutex<ChainState>,
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuditLog {
    /// An empty, unbounded log
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ChainState {
                records: VecDeque::new(),
                base_hash: [0u8; 32],
                next_sequence: 0,
                capacity: None,
            }),
        }
    }

    /// An empty log that retains at most `capacity` records
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ChainState {
                records: VecDeque::with_capacity(capacity),
                base_hash: [0u8; 32],
                next_sequence: 0,
                capacity: Some(capacity.max(1)),
            }),
        }
    }

    /// Rehydrate a previously exported chain
    ///
    /// The records are taken as-is and anchored at the first record's
    /// `prev_hash`; call [`MemoryAuditLog::verify_integrity`] to check
    /// them.
    #[must_use]
    pub fn restore(records: Vec<SealedRecord>) -> Self {
        let base_hash = records.first().map_or([0u8; 32], |r| r.prev_hash);
        let next_sequence = records.last().map_or(0, |r| r.sequence.saturating_add(1));
        Self {
            inner: Mutex::new(ChainState {
                records: records.into(),
                base_hash,
                next_sequence,
                capacity: None,
            }),
        }
    }

    /// Seal and append one record
    ///
    /// # Errors
    /// Fails only when the record cannot be serialized for hashing.
    pub fn append(&self, record: AuditRecord) -> Result<SealedRecord, AuditError> {
        let mut guard = self.inner.lock();
        let prev_hash = guard.records.back().map_or(guard.base_hash, |r| r.hash);
        let mut sealed = SealedRecord {
            sequence: guard.next_sequence,
            recorded_at: Utc::now(),
            record,
            prev_hash,
            hash: [0u8; 32],
        };
        sealed.hash = compute_hash(&sealed)?;
        guard.next_sequence = guard.next_sequence.saturating_add(1);
        guard.records.push_back(sealed.clone());
        if let Some(capacity) = guard.capacity {
            while guard.records.len() > capacity {
                if let Some(trimmed) = guard.records.pop_front() {
                    guard.base_hash = trimmed.hash;
                }
            }
        }
        Ok(sealed)
    }

    /// Snapshot of the retained chain, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<SealedRecord> {
        self.inner.lock().records.iter().cloned().collect()
    }

    /// Number of retained records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// True when nothing is retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Replay the retained chain and verify every link
    ///
    /// # Errors
    /// Reports the first sequence whose link or hash does not hold.
    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let guard = self.inner.lock();
        let mut prev = guard.base_hash;
        for sealed in &guard.records {
            if sealed.prev_hash != prev {
                return Err(AuditError::IntegrityViolation {
                    sequence: sealed.sequence,
                });
            }
            if sealed.hash != compute_hash(sealed)? {
                return Err(AuditError::IntegrityViolation {
                    sequence: sealed.sequence,
                });
            }
            prev = sealed.hash;
        }
        Ok(())
    }
}

#[async_trait]
impl AuditSink for MemoryAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.append(record.clone()).map(|_| ())
    }
}

/// Appends records to a file, one JSON object per line
///
/// The file sink carries plain records, not sealed ones; tamper
/// evidence is the in-memory chain's job, export is this one's.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl JsonlAuditSink {
    /// Open (or create) the file in append mode
    ///
    /// # Errors
    /// Fails when the file cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Where the records go
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = self.file.lock();
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aog_breaker::BreakerState;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn breaker_record() -> AuditRecord {
        AuditRecord::Breaker {
            event: BreakerEvent::ManualReset {
                target: TargetId::new("web"),
                at: t0(),
                previous: BreakerState::Open,
            },
        }
    }

    #[test]
    fn operation_ids_render_as_ulids() {
        let id = OperationId::new();
        assert_eq!(id.to_string().len(), 26);
        let json = serde_json::to_string(&id).unwrap();
        let back: OperationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn chain_starts_at_zero_hash_and_verifies() {
        let log = MemoryAuditLog::new();
        let first = log.append(breaker_record()).unwrap();
        let second = log.append(breaker_record()).unwrap();

        assert_eq!(first.prev_hash, [0u8; 32]);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(log.len(), 2);
        log.verify_integrity().unwrap();
    }

    #[test]
    fn tampered_record_is_detected_with_its_sequence() {
        let log = MemoryAuditLog::new();
        log.append(breaker_record()).unwrap();
        log.append(breaker_record()).unwrap();
        log.append(breaker_record()).unwrap();

        let mut records = log.entries();
        records[1].record = AuditRecord::Breaker {
            event: BreakerEvent::ManualReset {
                target: TargetId::new("not-web"),
                at: t0(),
                previous: BreakerState::Closed,
            },
        };
        let tampered = MemoryAuditLog::restore(records);
        match tampered.verify_integrity() {
            Err(AuditError::IntegrityViolation { sequence }) => assert_eq!(sequence, 1),
            other => panic!("expected integrity violation, got {other:?}"),
        }
    }

    #[test]
    fn broken_link_is_detected() {
        let log = MemoryAuditLog::new();
        log.append(breaker_record()).unwrap();
        log.append(breaker_record()).unwrap();

        let mut records = log.entries();
        records[1].prev_hash = [7u8; 32];
        let tampered = MemoryAuditLog::restore(records);
        assert!(matches!(
            tampered.verify_integrity(),
            Err(AuditError::IntegrityViolation { sequence: 1 })
        ));
    }

    #[test]
    fn capped_log_trims_oldest_but_still_verifies() {
        let log = MemoryAuditLog::with_capacity(2);
        for _ in 0..5 {
            log.append(breaker_record()).unwrap();
        }
        assert_eq!(log.len(), 2);
        let entries = log.entries();
        // Sequences keep counting past the trimmed records.
        assert_eq!(entries[0].sequence, 3);
        assert_eq!(entries[1].sequence, 4);
        log.verify_integrity().unwrap();
    }

    #[test]
    fn record_accessors_name_kind_and_target() {
        let record = breaker_record();
        assert_eq!(record.kind(), "breaker");
        assert_eq!(record.target().as_str(), "web");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"breaker\""));
        assert!(json.contains("\"event\":\"manual_reset\""));
    }

    #[tokio::test]
    async fn jsonl_sink_writes_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = JsonlAuditSink::open(&path).unwrap();

        sink.record(&breaker_record()).await.unwrap();
        sink.record(&breaker_record()).await.unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let back: AuditRecord = serde_json::from_str(line).unwrap();
            assert_eq!(back.kind(), "breaker");
        }
    }

    #[tokio::test]
    async fn memory_log_implements_the_sink_trait() {
        let log = MemoryAuditLog::new();
        let sink: &dyn AuditSink = &log;
        sink.record(&breaker_record()).await.unwrap();
        assert_eq!(log.len(), 1);
        log.verify_integrity().unwrap();
    }
}
