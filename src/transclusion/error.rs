use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::types::identifiers::DocumentId;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    /// `cycle_path` runs from the first repeated document back to itself.
    #[error("Circular dependency: {}", join_path(.cycle_path))]
    CircularDependency { cycle_path: Vec<DocumentId> },

    #[error("Missing reference '{reference}' in {from_path}")]
    MissingReference {
        from_path: DocumentId,
        reference: String,
    },

    #[error("Inclusion depth exceeds {max_depth} at {path}")]
    DepthExceeded { path: DocumentId, max_depth: usize },
}

fn join_path(path: &[DocumentId]) -> String {
    path.iter()
        .map(DocumentId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// One root cause and every document excluded because of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionFailure {
    pub error: ResolveError,
    pub excluded: BTreeSet<DocumentId>,
}
