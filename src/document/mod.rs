pub mod document;
pub mod markdown;
pub mod section;
pub mod terms;
pub mod tokens;

pub use crate::types::identifiers::{DocumentId, Fingerprint};
pub use document::{Document, DocumentError, SourceDocument};
pub use section::{parse_sections, section_slice, Section};
pub use tokens::{ApproxTokenCounter, TokenCounter};
