use chrono::{DateTime, Utc};
use thiserror::Error;

use super::section::{parse_sections, Section};
use super::tokens::TokenCounter;
use crate::types::identifiers::{DocumentId, Fingerprint};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Content must be valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Raw, unresolved document content as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    pub id: DocumentId,
    pub version: Fingerprint,
    pub content: String,
}

impl SourceDocument {
    /// Ingest raw bytes into a SourceDocument.
    ///
    /// This is the ONLY way to construct one: the version is always the
    /// fingerprint of the verified bytes.
    pub fn ingest(id: DocumentId, raw_content: Vec<u8>) -> Result<Self, DocumentError> {
        let content = String::from_utf8(raw_content)?;
        let version = Fingerprint::from_content(content.as_bytes());

        Ok(SourceDocument {
            id,
            version,
            content,
        })
    }

    pub fn byte_len(&self) -> usize {
        self.content.len()
    }
}

/// An indexed document: its fingerprint plus the sections of its fully
/// resolved text. Replaced wholesale when content changes, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub version: Fingerprint,
    /// Length of the raw, unresolved content.
    pub byte_len: usize,
    /// Sum of section token counts.
    pub tokens: usize,
    pub scanned_at: DateTime<Utc>,
    pub sections: Vec<Section>,
    /// Every document reached through inclusion directives, sorted.
    pub dependencies: Vec<DocumentId>,
}

impl Document {
    pub fn assemble(
        source: &SourceDocument,
        resolved_text: &str,
        dependencies: Vec<DocumentId>,
        scanned_at: DateTime<Utc>,
        counter: &dyn TokenCounter,
    ) -> Self {
        let sections = parse_sections(resolved_text, counter);
        let tokens = sections.iter().map(|s| s.tokens).sum();

        Document {
            id: source.id.clone(),
            version: source.version.clone(),
            byte_len: source.byte_len(),
            tokens,
            scanned_at,
            sections,
            dependencies,
        }
    }
}
