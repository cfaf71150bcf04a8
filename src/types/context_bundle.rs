use serde::{Deserialize, Serialize};

use crate::document::terms::tokenize;
use crate::document::Section;
use crate::types::identifiers::{DocumentId, Fingerprint};

/// A normalized task description.
/// Normalization rules:
/// - Lowercase
/// - Split on anything that is not alphanumeric
/// - Repeated terms kept once, in first-seen order
#[derive(Debug, Clone)]
pub struct Query {
    pub raw: String,
    pub terms: Vec<String>,
}

impl Query {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut terms: Vec<String> = Vec::new();
        for term in tokenize(&raw) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }

        Self { raw, terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A selected section returned in the output.
/// Fully self-contained and serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSection {
    pub path: String,
    pub section_heading: String,
    pub section_order: usize,
    pub version: String,

    pub score: f32,
    pub tokens: usize,

    /// Owned here because it is part of the final output payload.
    pub content: String,
}

/// Metadata describing the outcome of the selection process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionMetadata {
    pub query: String,
    pub max_tokens: usize,
    pub min_score: f32,
    pub snapshot_version: u64,

    pub sections_considered: usize,
    pub sections_selected: usize,
    pub sections_excluded_by_score: usize,
    pub sections_excluded_by_budget: usize,
}

/// The final result of a query. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub items: Vec<SelectedSection>,
    pub total_tokens: usize,
    pub total_score: f32,
    pub selection: SelectionMetadata,
}

/// A section that has been scored against one query but not yet selected.
/// Borrows from the snapshot to avoid cloning content prematurely.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub path: &'a DocumentId,
    pub version: &'a Fingerprint,
    pub section: &'a Section,

    /// Normalized relevance in `[0.0, 1.0]`.
    pub score: f32,
}

impl ScoredCandidate<'_> {
    pub fn tokens(&self) -> usize {
        self.section.tokens
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Task description contains no searchable terms")]
    EmptyQuery,

    #[error("Invalid minimum score: {0} (expected a value in [0.0, 1.0])")]
    InvalidMinScore(f32),
}
