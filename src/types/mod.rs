pub mod context_bundle;
pub mod identifiers;

pub use context_bundle::{
    Query, QueryError, ScoredCandidate, SelectedSection, SelectionMetadata, SelectionResult,
};
pub use identifiers::{DocumentId, DocumentIdError, Fingerprint};
