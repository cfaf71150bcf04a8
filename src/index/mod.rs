//! Snapshot publication and the refresh lifecycle.
//!
//! A refresh moves through `Scanning -> Diffing -> Resolving -> Publishing`
//! and ends by swapping the published [`IndexSnapshot`] pointer. Queries hold
//! their own `Arc` of a snapshot, so a refresh finishing mid-query is never
//! observed.

pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod snapshot;

pub use report::{IndexFailure, RefreshError, RefreshOutcome, RefreshPhase, RefreshReport};
pub use scheduler::IndexScheduler;
pub use snapshot::{CorpusStats, IndexSnapshot, SnapshotHandle};
