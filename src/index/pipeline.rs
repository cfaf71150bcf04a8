//! The synchronous stages of one refresh: scan, resolve, record.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::report::{IndexFailure, RefreshError};
use super::snapshot::IndexSnapshot;
use crate::document::{Document, DocumentError, SourceDocument, TokenCounter};
use crate::fingerprint::{CorpusDiff, FingerprintRecord, FingerprintState};
use crate::storage::CorpusStorage;
use crate::transclusion::ResolutionPass;
use crate::types::identifiers::{DocumentId, Fingerprint};

/// A file that was read and hashed.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub version: Fingerprint,
    pub byte_len: usize,
}

/// Everything read from storage in one pass.
#[derive(Debug, Default)]
pub struct CorpusScan {
    pub scanned_at: DateTime<Utc>,
    pub files: BTreeMap<DocumentId, ScannedFile>,
    /// Decodable documents, the input to resolution.
    pub sources: BTreeMap<DocumentId, SourceDocument>,
    pub failures: Vec<IndexFailure>,
}

impl CorpusScan {
    pub fn fingerprints(&self) -> BTreeMap<DocumentId, Fingerprint> {
        self.files
            .iter()
            .map(|(id, file)| (id.clone(), file.version.clone()))
            .collect()
    }
}

/// List, read and hash every corpus file. Only a listing failure fails the
/// scan; unreadable or undecodable files become per-document failures.
pub fn scan_corpus(storage: &dyn CorpusStorage, root: &Path) -> Result<CorpusScan, RefreshError> {
    let listing = storage
        .list_corpus_files(root)
        .map_err(|e| RefreshError::Scan(e.to_string()))?;

    let mut scan = CorpusScan {
        scanned_at: Utc::now(),
        ..CorpusScan::default()
    };

    for file in listing {
        let path_str = file.path.display().to_string();
        let id = match DocumentId::from_path(root, &file.path) {
            Ok(id) => id,
            Err(e) => {
                warn!(path = %path_str, error = %e, "skipping corpus file");
                scan.failures.push(IndexFailure::Unreadable {
                    path: path_str,
                    cause: e.to_string(),
                });
                continue;
            }
        };
        if scan.files.contains_key(&id) {
            warn!(path = %path_str, id = %id, "duplicate document id");
            scan.failures.push(IndexFailure::DuplicateId { path: path_str, id });
            continue;
        }

        let bytes = match storage.read_file(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path_str, error = %e, "failed to read corpus file");
                scan.failures.push(IndexFailure::Unreadable {
                    path: path_str,
                    cause: e.to_string(),
                });
                continue;
            }
        };

        match SourceDocument::ingest(id.clone(), bytes) {
            Ok(source) => {
                scan.files.insert(
                    id.clone(),
                    ScannedFile {
                        version: source.version.clone(),
                        byte_len: source.byte_len(),
                    },
                );
                scan.sources.insert(id, source);
            }
            Err(DocumentError::InvalidUtf8(e)) => {
                warn!(id = %id, "document is not valid UTF-8");
                let bytes = e.into_bytes();
                scan.files.insert(
                    id.clone(),
                    ScannedFile {
                        version: Fingerprint::from_content(&bytes),
                        byte_len: bytes.len(),
                    },
                );
                scan.failures.push(IndexFailure::InvalidUtf8 { id });
            }
        }
    }

    Ok(scan)
}

/// Documents ready for the next snapshot.
#[derive(Debug, Default)]
pub struct ResolvedCorpus {
    pub documents: BTreeMap<DocumentId, Arc<Document>>,
    pub failures: Vec<IndexFailure>,
    pub resolved: usize,
    pub reused: usize,
}

/// Resolve and section every document that needs it; carry the rest over
/// from `previous` unchanged.
///
/// A document is carried over when it is in `previous`, its fingerprint is
/// the same, and nothing on its transitive include path was added, changed
/// or removed. `force` disables carrying over.
pub fn resolve_corpus(
    scan: &CorpusScan,
    diff: &CorpusDiff,
    previous: &IndexSnapshot,
    force: bool,
    max_depth: usize,
    counter: &dyn TokenCounter,
) -> ResolvedCorpus {
    let dirty: BTreeSet<DocumentId> = diff.dirty();
    let mut pass = ResolutionPass::new(&scan.sources, max_depth);
    let mut out = ResolvedCorpus::default();

    for (id, source) in &scan.sources {
        if !force {
            if let Some(prior) = previous.get(id) {
                let stale_path = prior.dependencies.iter().any(|d| dirty.contains(d));
                if prior.version == source.version && !stale_path {
                    out.documents.insert(id.clone(), Arc::clone(prior));
                    out.reused += 1;
                    continue;
                }
            }
        }

        match pass.resolve(id) {
            Ok(resolved) => {
                let document = Document::assemble(
                    source,
                    resolved.text(),
                    resolved.dependencies(),
                    scan.scanned_at,
                    counter,
                );
                out.documents.insert(id.clone(), Arc::new(document));
                out.resolved += 1;
            }
            Err(e) => debug!(id = %id, error = %e, "document excluded"),
        }
    }

    out.failures = pass.into_failures().into_iter().map(IndexFailure::from).collect();
    for failure in &out.failures {
        warn!(failure = ?failure, "resolution failure");
    }
    out
}

/// The fingerprint state to commit: every hashed file, indexed or not.
pub fn fingerprint_state(scan: &CorpusScan, documents: &BTreeMap<DocumentId, Arc<Document>>) -> FingerprintState {
    scan.files
        .iter()
        .map(|(id, file)| match documents.get(id) {
            Some(document) => FingerprintRecord::indexed(document),
            None => FingerprintRecord::excluded(
                id.clone(),
                file.version.clone(),
                file.byte_len,
                scan.scanned_at,
            ),
        })
        .collect()
}
