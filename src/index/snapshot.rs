use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::document::{Document, Section};
use crate::types::identifiers::DocumentId;

/// Corpus-wide statistics, a pure function of one snapshot's sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    pub document_count: usize,
    pub section_count: usize,
    pub total_tokens: usize,
    /// Number of sections containing each term.
    pub section_frequency: BTreeMap<String, usize>,
}

impl CorpusStats {
    pub fn compute<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut stats = CorpusStats::default();
        for document in documents {
            stats.document_count += 1;
            stats.total_tokens += document.tokens;
            for section in &document.sections {
                stats.section_count += 1;
                for term in section.term_counts.keys() {
                    *stats.section_frequency.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }
        stats
    }

    /// `ln(1 + N / df)`: positive for every term present, rarer terms weigh
    /// more, zero for terms absent from the corpus.
    pub fn inverse_document_frequency(&self, term: &str) -> f64 {
        match self.section_frequency.get(term) {
            Some(&df) if df > 0 => (1.0 + self.section_count as f64 / df as f64).ln(),
            _ => 0.0,
        }
    }
}

/// An immutable, versioned view of the indexed corpus.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub version: u64,
    pub created_at: DateTime<Utc>,
    documents: BTreeMap<DocumentId, Arc<Document>>,
    stats: CorpusStats,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self::new(0, BTreeMap::new())
    }

    pub fn new(version: u64, documents: BTreeMap<DocumentId, Arc<Document>>) -> Self {
        let stats = CorpusStats::compute(documents.values().map(|d| d.as_ref()));
        Self {
            version,
            created_at: Utc::now(),
            documents,
            stats,
        }
    }

    pub fn stats(&self) -> &CorpusStats {
        &self.stats
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Arc<Document>> {
        self.documents.get(id)
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.contains_key(id)
    }

    /// Documents in id order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values().map(|d| d.as_ref())
    }

    /// Every section, ordered by document id then section order.
    pub fn sections(&self) -> impl Iterator<Item = (&Document, &Section)> {
        self.documents()
            .flat_map(|d| d.sections.iter().map(move |s| (d, s)))
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// The currently published snapshot.
///
/// The lock is held only to clone or swap the pointer; readers keep their
/// `Arc` for as long as they need a consistent view.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<IndexSnapshot>>,
}

impl SnapshotHandle {
    pub fn new(initial: IndexSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    pub fn load(&self) -> Arc<IndexSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    pub fn publish(&self, snapshot: IndexSnapshot) -> Arc<IndexSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&snapshot);
        snapshot
    }
}

impl Default for SnapshotHandle {
    fn default() -> Self {
        Self::new(IndexSnapshot::empty())
    }
}
