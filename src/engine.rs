//! The engine's API surface: `refresh`, `query` and `stats`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::EngineConfig;
use crate::document::ApproxTokenCounter;
use crate::fingerprint::{FingerprintStore, LoadOutcome};
use crate::index::{IndexScheduler, RefreshError, RefreshOutcome, RefreshPhase};
use crate::selection::{ContextSelector, TfIdfScorer};
use crate::storage::{CorpusStorage, FsStorage};
use crate::types::context_bundle::{Query, QueryError, SelectionResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStats {
    pub document_count: usize,
    pub section_count: usize,
    pub total_tokens: usize,
    pub snapshot_version: u64,
    pub last_refresh_timestamp: Option<DateTime<Utc>>,
    pub last_refresh_error_count: usize,
    pub phase: RefreshPhase,
    pub degraded: bool,
    pub skipped_refreshes: u64,
}

pub struct ContextEngine {
    config: EngineConfig,
    scheduler: IndexScheduler,
    selector: ContextSelector<TfIdfScorer>,
}

impl ContextEngine {
    pub fn new(config: EngineConfig, storage: Arc<dyn CorpusStorage>) -> Self {
        let store = match &config.snapshot_path {
            Some(path) => FingerprintStore::open(path),
            None => FingerprintStore::in_memory(),
        };
        if let LoadOutcome::Corrupted { cause } = store.load_outcome() {
            debug!(cause = %cause, "starting from an empty fingerprint state");
        }

        let scheduler = IndexScheduler::new(
            config.corpus_root.clone(),
            storage,
            store,
            Arc::new(ApproxTokenCounter),
            config.max_include_depth,
        );

        Self {
            config,
            scheduler,
            selector: ContextSelector::default(),
        }
    }

    /// An engine reading its corpus from the local filesystem.
    pub fn with_filesystem(config: EngineConfig) -> Self {
        let storage = Arc::new(FsStorage::new(&config.extensions));
        Self::new(config, storage)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &IndexScheduler {
        &self.scheduler
    }

    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, RefreshError> {
        self.scheduler.refresh(force).await
    }

    /// Select the sections most relevant to `task_description` within
    /// `max_tokens`. Runs entirely against the snapshot current at call start.
    pub fn query(
        &self,
        task_description: &str,
        max_tokens: usize,
        min_score: f32,
    ) -> Result<SelectionResult, QueryError> {
        let snapshot = self.scheduler.snapshot();
        self.selector
            .select(&snapshot, Query::new(task_description), max_tokens, min_score)
    }

    /// `query` with the configured default budget and minimum score.
    pub fn query_default(&self, task_description: &str) -> Result<SelectionResult, QueryError> {
        self.query(
            task_description,
            self.config.default_max_tokens,
            self.config.default_min_score,
        )
    }

    pub fn stats(&self) -> EngineStats {
        let snapshot = self.scheduler.snapshot();
        let corpus = snapshot.stats();
        let last = self.scheduler.last_refresh();

        EngineStats {
            document_count: corpus.document_count,
            section_count: corpus.section_count,
            total_tokens: corpus.total_tokens,
            snapshot_version: snapshot.version,
            last_refresh_timestamp: last.map(|(at, _)| at),
            last_refresh_error_count: last.map(|(_, errors)| errors).unwrap_or(0),
            phase: self.scheduler.phase(),
            degraded: self.scheduler.is_degraded(),
            skipped_refreshes: self.scheduler.skipped_refreshes(),
        }
    }

    /// Start timer-triggered refreshes at the configured interval.
    pub fn spawn_background_refresh(&self) -> JoinHandle<()> {
        self.scheduler.spawn_periodic(self.config.refresh_interval())
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
