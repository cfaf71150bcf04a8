use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::diff::CorpusDiff;
use super::manifest::{FingerprintManifest, FingerprintState, ManifestFormat};
use crate::types::identifiers::{DocumentId, Fingerprint};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Fingerprint snapshot is corrupted: {cause}")]
    Corrupted { cause: String },
}

/// What `open` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No durable snapshot configured, or none written yet.
    Fresh,
    Restored { documents: usize },
    /// The snapshot could not be trusted; the store starts empty so the next
    /// refresh rebuilds everything.
    Corrupted { cause: String },
}

/// Single-writer store of the committed fingerprint state.
///
/// Readers get an `Arc` of the whole state, so they observe either the old
/// or the new commit and never a partial one.
#[derive(Debug)]
pub struct FingerprintStore {
    path: Option<PathBuf>,
    format: ManifestFormat,
    committed: RwLock<Arc<FingerprintState>>,
    load_outcome: LoadOutcome,
}

impl FingerprintStore {
    /// A store with no durable snapshot.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            format: ManifestFormat::v0(),
            committed: RwLock::new(Arc::new(FingerprintState::new())),
            load_outcome: LoadOutcome::Fresh,
        }
    }

    /// Open the durable snapshot at `path`. Never fails: an unreadable or
    /// inconsistent snapshot is reported through [`LoadOutcome::Corrupted`].
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = ManifestFormat::v0();

        let (state, load_outcome) = match load_state(&path, &format) {
            Ok(Some(state)) => {
                let documents = state.len();
                info!(path = %path.display(), documents, "restored fingerprint snapshot");
                (state, LoadOutcome::Restored { documents })
            }
            Ok(None) => {
                debug!(path = %path.display(), "no fingerprint snapshot yet");
                (FingerprintState::new(), LoadOutcome::Fresh)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "fingerprint snapshot corrupted, full rebuild");
                (
                    FingerprintState::new(),
                    LoadOutcome::Corrupted { cause: e.to_string() },
                )
            }
        };

        Self {
            path: Some(path),
            format,
            committed: RwLock::new(Arc::new(state)),
            load_outcome,
        }
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn committed(&self) -> Arc<FingerprintState> {
        // The guarded value is a pointer; a poisoned lock still holds a
        // complete state.
        let guard = self.committed.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Pure comparison against the last committed state.
    pub fn diff_against(&self, current: &BTreeMap<DocumentId, Fingerprint>) -> CorpusDiff {
        CorpusDiff::compute(&self.committed(), current)
    }

    /// Durably write `state`, then make it the committed state.
    ///
    /// On a write failure the previous committed state is left in place.
    pub fn commit(&self, state: FingerprintState) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            let manifest = state.to_manifest(self.format.clone())?;
            write_manifest(path, &manifest)?;
        }

        let state = Arc::new(state);
        let mut guard = self.committed.write().unwrap_or_else(|e| e.into_inner());
        *guard = state;
        Ok(())
    }
}

fn load_state(path: &Path, format: &ManifestFormat) -> Result<Option<FingerprintState>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    let manifest: FingerprintManifest =
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupted { cause: e.to_string() })?;

    if &manifest.format != format {
        return Err(StoreError::Corrupted {
            cause: format!(
                "unsupported format {} / {}",
                manifest.format.version, manifest.format.hash_algorithm
            ),
        });
    }
    if manifest.document_count != manifest.documents.len() {
        return Err(StoreError::Corrupted {
            cause: format!(
                "manifest declares {} documents but lists {}",
                manifest.document_count,
                manifest.documents.len()
            ),
        });
    }
    if let Some(bad) = manifest.documents.iter().find(|r| !r.version.is_well_formed()) {
        return Err(StoreError::Corrupted {
            cause: format!("malformed fingerprint for {}", bad.id),
        });
    }

    let expected_hash = manifest.state_hash.clone();
    let state: FingerprintState = manifest.documents.into_iter().collect();
    if state.len() != manifest.document_count {
        return Err(StoreError::Corrupted {
            cause: "duplicate document ids".to_string(),
        });
    }
    let actual_hash = state.state_hash(format)?;
    if actual_hash != expected_hash {
        return Err(StoreError::Corrupted {
            cause: format!("state hash mismatch: manifest says {expected_hash}, records hash to {actual_hash}"),
        });
    }

    Ok(Some(state))
}

/// Write to a sibling temp file, fsync, then rename over the target.
fn write_manifest(path: &Path, manifest: &FingerprintManifest) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut f = fs::File::create(&temp_path)?;
        serde_json::to_writer_pretty(&mut f, manifest)?;
        f.flush()?;
        f.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}
