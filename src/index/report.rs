use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::transclusion::{ResolutionFailure, ResolveError};
use crate::types::identifiers::DocumentId;

/// Refresh lifecycle. `Degraded` is entered when the durable write fails; the
/// previously published snapshot keeps serving until a later refresh succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPhase {
    Idle,
    Scanning,
    Diffing,
    Resolving,
    Publishing,
    Degraded,
}

impl RefreshPhase {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            RefreshPhase::Idle => 0,
            RefreshPhase::Scanning => 1,
            RefreshPhase::Diffing => 2,
            RefreshPhase::Resolving => 3,
            RefreshPhase::Publishing => 4,
            RefreshPhase::Degraded => 5,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RefreshPhase::Scanning,
            2 => RefreshPhase::Diffing,
            3 => RefreshPhase::Resolving,
            4 => RefreshPhase::Publishing,
            5 => RefreshPhase::Degraded,
            _ => RefreshPhase::Idle,
        }
    }
}

/// A per-document problem recorded during a refresh. Never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexFailure {
    Resolution {
        error: ResolveError,
        excluded: BTreeSet<DocumentId>,
    },
    Unreadable {
        path: String,
        cause: String,
    },
    InvalidUtf8 {
        id: DocumentId,
    },
    DuplicateId {
        path: String,
        id: DocumentId,
    },
}

impl From<ResolutionFailure> for IndexFailure {
    fn from(failure: ResolutionFailure) -> Self {
        IndexFailure::Resolution {
            error: failure.error,
            excluded: failure.excluded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshReport {
    pub added_count: usize,
    pub changed_count: usize,
    pub removed_count: usize,
    pub unchanged_count: usize,
    pub error_count: usize,
    pub timestamp: DateTime<Utc>,

    pub snapshot_version: u64,
    pub documents_resolved: usize,
    pub documents_reused: usize,
    pub duration_ms: u64,
    pub failures: Vec<IndexFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Completed(RefreshReport),
    /// A timer-triggered refresh arrived while another was running.
    Skipped,
}

impl RefreshOutcome {
    pub fn report(&self) -> Option<&RefreshReport> {
        match self {
            RefreshOutcome::Completed(report) => Some(report),
            RefreshOutcome::Skipped => None,
        }
    }
}

/// Whole-refresh failures. The previously published snapshot stays in place
/// for every one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("Corpus scan failed: {0}")]
    Scan(String),

    #[error("Durable snapshot write failed: {0}")]
    Persist(String),

    #[error("Refresh cancelled by shutdown")]
    Cancelled,

    #[error("Refresh task failed: {0}")]
    Task(String),
}
