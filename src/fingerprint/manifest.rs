use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::{Document, Section};
use crate::types::identifiers::{DocumentId, Fingerprint};

// Key point:
// Serializable
// Comparable
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFormat {
    pub version: String,
    pub hash_algorithm: String,
}

impl ManifestFormat {
    pub fn v0() -> Self {
        Self {
            version: "1".into(),
            hash_algorithm: "sha256".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBoundary {
    pub heading: String,
    pub start: usize,
    pub end: usize,
    pub tokens: usize,
}

impl From<&Section> for SectionBoundary {
    fn from(section: &Section) -> Self {
        Self {
            heading: section.heading.clone(),
            start: section.start,
            end: section.end,
            tokens: section.tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    pub id: DocumentId,
    pub version: Fingerprint,
    pub byte_len: usize,
    pub tokens: usize,
    pub scanned_at: DateTime<Utc>,
    /// False when the document was excluded from the published snapshot
    /// (resolution failure or undecodable content).
    pub indexed: bool,
    pub sections: Vec<SectionBoundary>,
}

impl FingerprintRecord {
    pub fn indexed(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            version: document.version.clone(),
            byte_len: document.byte_len,
            tokens: document.tokens,
            scanned_at: document.scanned_at,
            indexed: true,
            sections: document.sections.iter().map(SectionBoundary::from).collect(),
        }
    }

    pub fn excluded(
        id: DocumentId,
        version: Fingerprint,
        byte_len: usize,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version,
            byte_len,
            tokens: 0,
            scanned_at,
            indexed: false,
            sections: Vec::new(),
        }
    }
}

/// The committed state: one record per known document, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintState {
    records: BTreeMap<DocumentId, FingerprintRecord>,
}

impl FingerprintState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: FingerprintRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &DocumentId) -> Option<&FingerprintRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &FingerprintRecord> {
        self.records.values()
    }

    /// sha256 over the format and the sorted `id:version` lines.
    pub fn state_hash(&self, format: &ManifestFormat) -> Result<String, serde_json::Error> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(format)?);
        for record in self.records.values() {
            let line = format!("{}:{}", record.id.as_str(), record.version.as_str());
            hasher.update(line.as_bytes());
        }
        Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    pub fn to_manifest(&self, format: ManifestFormat) -> Result<FingerprintManifest, serde_json::Error> {
        Ok(FingerprintManifest {
            state_hash: self.state_hash(&format)?,
            format,
            // informational only
            created_at: Utc::now(),
            document_count: self.records.len(),
            documents: self.records.values().cloned().collect(),
        })
    }
}

impl FromIterator<FingerprintRecord> for FingerprintState {
    fn from_iter<I: IntoIterator<Item = FingerprintRecord>>(iter: I) -> Self {
        let mut state = FingerprintState::new();
        for record in iter {
            state.insert(record);
        }
        state
    }
}

/// On-disk form of a committed [`FingerprintState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintManifest {
    pub state_hash: String,
    pub format: ManifestFormat,
    pub created_at: DateTime<Utc>,
    pub document_count: usize,
    pub documents: Vec<FingerprintRecord>,
}
