use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{watch, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::pipeline::{fingerprint_state, resolve_corpus, scan_corpus};
use super::report::{RefreshError, RefreshOutcome, RefreshPhase, RefreshReport};
use super::snapshot::{IndexSnapshot, SnapshotHandle};
use crate::document::TokenCounter;
use crate::fingerprint::FingerprintStore;
use crate::storage::CorpusStorage;

type RefreshResult = Result<RefreshReport, RefreshError>;

/// Owns the refresh lifecycle and the published snapshot.
///
/// At most one refresh runs at a time. A timer-triggered refresh that finds
/// one running is skipped. A forced refresh waits for the running one and
/// then runs; forced requests that arrive while one is already queued share
/// its result, so at most one refresh is ever pending.
#[derive(Clone)]
pub struct IndexScheduler {
    inner: Arc<SchedulerState>,
}

struct SchedulerState {
    root: PathBuf,
    storage: Arc<dyn CorpusStorage>,
    store: FingerprintStore,
    snapshot: SnapshotHandle,
    counter: Arc<dyn TokenCounter>,
    max_depth: usize,

    /// Owned by the blocking refresh task until that task finishes.
    run_lock: Arc<tokio::sync::Mutex<()>>,
    /// Result channel of the queued forced refresh, if any.
    pending: Mutex<Option<watch::Receiver<Option<RefreshResult>>>>,

    phase: AtomicU8,
    degraded: AtomicBool,
    skipped: AtomicU64,
    last_refresh: RwLock<Option<(DateTime<Utc>, usize)>>,
    shutdown: CancellationToken,
}

impl IndexScheduler {
    pub fn new(
        root: impl Into<PathBuf>,
        storage: Arc<dyn CorpusStorage>,
        store: FingerprintStore,
        counter: Arc<dyn TokenCounter>,
        max_depth: usize,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerState {
                root: root.into(),
                storage,
                store,
                snapshot: SnapshotHandle::default(),
                counter,
                max_depth,
                run_lock: Arc::new(tokio::sync::Mutex::new(())),
                pending: Mutex::new(None),
                phase: AtomicU8::new(RefreshPhase::Idle.as_u8()),
                degraded: AtomicBool::new(false),
                skipped: AtomicU64::new(0),
                last_refresh: RwLock::new(None),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// The currently published snapshot. Hold on to it for a consistent view.
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.inner.snapshot.load()
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.inner.store
    }

    pub fn phase(&self) -> RefreshPhase {
        RefreshPhase::from_u8(self.inner.phase.load(Ordering::Acquire))
    }

    pub fn is_degraded(&self) -> bool {
        self.inner.degraded.load(Ordering::Acquire)
    }

    pub fn skipped_refreshes(&self) -> u64 {
        self.inner.skipped.load(Ordering::Relaxed)
    }

    /// Timestamp and error count of the last completed refresh.
    pub fn last_refresh(&self) -> Option<(DateTime<Utc>, usize)> {
        *self
            .inner
            .last_refresh
            .read()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Stop the background loop and cancel an in-flight refresh at its next
    /// stage boundary.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// `force == false` is the timer policy (skip when busy); `force == true`
    /// queues behind a running refresh and re-resolves every document.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome, RefreshError> {
        if self.inner.shutdown.is_cancelled() {
            return Err(RefreshError::Cancelled);
        }
        if force {
            self.refresh_forced().await.map(RefreshOutcome::Completed)
        } else {
            self.refresh_if_idle().await
        }
    }

    async fn refresh_if_idle(&self) -> Result<RefreshOutcome, RefreshError> {
        if self.has_pending_refresh() {
            return Ok(self.skip());
        }
        let Ok(guard) = Arc::clone(&self.inner.run_lock).try_lock_owned() else {
            return Ok(self.skip());
        };
        self.run_exclusive(false, guard, None)
            .await
            .map(RefreshOutcome::Completed)
    }

    async fn refresh_forced(&self) -> RefreshResult {
        let (waiter, sender) = {
            let mut slot = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
            match slot.as_ref() {
                Some(rx) if rx.has_changed().is_ok() => (Some(rx.clone()), None),
                _ => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx);
                    (None, Some(tx))
                }
            }
        };

        if let Some(mut rx) = waiter {
            debug!("joining queued forced refresh");
            let result = rx
                .wait_for(Option::is_some)
                .await
                .map_err(|_| RefreshError::Task("queued refresh was dropped".to_string()))?;
            return result
                .clone()
                .unwrap_or_else(|| Err(RefreshError::Task("queued refresh produced no result".to_string())));
        }

        let guard = Arc::clone(&self.inner.run_lock).lock_owned().await;
        // Running now: later forced requests queue a new refresh.
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        self.run_exclusive(true, guard, sender).await
    }

    /// True while a forced refresh is queued behind the running one.
    pub fn has_pending_refresh(&self) -> bool {
        let slot = self.inner.pending.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().map(|rx| rx.has_changed().is_ok()).unwrap_or(false)
    }

    fn skip(&self) -> RefreshOutcome {
        self.inner.skipped.fetch_add(1, Ordering::Relaxed);
        info!("refresh skipped: refresh in progress");
        RefreshOutcome::Skipped
    }

    /// The blocking work runs off the async workers so queries are never held
    /// up by scanning. It owns `guard` and the queued result channel, so both
    /// outlive a caller that stops waiting.
    async fn run_exclusive(
        &self,
        force: bool,
        guard: OwnedMutexGuard<()>,
        waiters: Option<watch::Sender<Option<RefreshResult>>>,
    ) -> RefreshResult {
        let state = Arc::clone(&self.inner);
        let work = tokio::task::spawn_blocking(move || {
            let result = state.run(force);
            if let Some(tx) = waiters {
                tx.send_replace(Some(result.clone()));
            }
            drop(guard);
            result
        });
        match work.await {
            Ok(result) => result,
            Err(e) => {
                self.inner.settle();
                Err(RefreshError::Task(e.to_string()))
            }
        }
    }

    /// Spawn the periodic refresh loop. The first refresh runs immediately.
    pub fn spawn_periodic(&self, interval: Duration) -> JoinHandle<()> {
        let scheduler = self.clone();
        let shutdown = self.inner.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("periodic refresh loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match scheduler.refresh(false).await {
                            Ok(RefreshOutcome::Completed(report)) => debug!(
                                version = report.snapshot_version,
                                errors = report.error_count,
                                "periodic refresh completed"
                            ),
                            Ok(RefreshOutcome::Skipped) => {}
                            Err(RefreshError::Cancelled) => break,
                            Err(e) => warn!(error = %e, "periodic refresh failed"),
                        }
                    }
                }
            }
        })
    }
}

impl SchedulerState {
    fn set_phase(&self, phase: RefreshPhase) {
        debug!(phase = ?phase, "refresh phase");
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    /// Back to rest: Degraded if the last durable write failed, else Idle.
    fn settle(&self) {
        let phase = if self.degraded.load(Ordering::Acquire) {
            RefreshPhase::Degraded
        } else {
            RefreshPhase::Idle
        };
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    fn cancelled(&self) -> Result<(), RefreshError> {
        if self.shutdown.is_cancelled() {
            info!("refresh cancelled, keeping previous snapshot");
            self.settle();
            return Err(RefreshError::Cancelled);
        }
        Ok(())
    }

    fn run(&self, force: bool) -> RefreshResult {
        let started = Instant::now();

        self.set_phase(RefreshPhase::Scanning);
        let scan = match scan_corpus(self.storage.as_ref(), &self.root) {
            Ok(scan) => scan,
            Err(e) => {
                error!(root = %self.root.display(), error = %e, "corpus scan failed");
                self.settle();
                return Err(e);
            }
        };

        self.set_phase(RefreshPhase::Diffing);
        let diff = self.store.diff_against(&scan.fingerprints());

        self.cancelled()?;
        self.set_phase(RefreshPhase::Resolving);
        let previous = self.snapshot.load();
        let resolved = resolve_corpus(
            &scan,
            &diff,
            &previous,
            force,
            self.max_depth,
            self.counter.as_ref(),
        );

        self.cancelled()?;
        self.set_phase(RefreshPhase::Publishing);
        let state = fingerprint_state(&scan, &resolved.documents);
        if let Err(e) = self.store.commit(state) {
            error!(error = %e, "durable snapshot write failed, serving previous snapshot");
            self.degraded.store(true, Ordering::Release);
            self.settle();
            return Err(RefreshError::Persist(e.to_string()));
        }

        let mut failures = scan.failures;
        failures.extend(resolved.failures);

        let snapshot = self
            .snapshot
            .publish(IndexSnapshot::new(previous.version + 1, resolved.documents));
        self.degraded.store(false, Ordering::Release);

        let report = RefreshReport {
            added_count: diff.added.len(),
            changed_count: diff.changed.len(),
            removed_count: diff.removed.len(),
            unchanged_count: diff.unchanged.len(),
            error_count: failures.len(),
            timestamp: snapshot.created_at,
            snapshot_version: snapshot.version,
            documents_resolved: resolved.resolved,
            documents_reused: resolved.reused,
            duration_ms: started.elapsed().as_millis() as u64,
            failures,
        };

        *self.last_refresh.write().unwrap_or_else(|e| e.into_inner()) =
            Some((report.timestamp, report.error_count));
        self.settle();

        info!(
            version = report.snapshot_version,
            added = report.added_count,
            changed = report.changed_count,
            removed = report.removed_count,
            unchanged = report.unchanged_count,
            errors = report.error_count,
            reused = report.documents_reused,
            duration_ms = report.duration_ms,
            "snapshot published"
        );

        Ok(report)
    }
}
