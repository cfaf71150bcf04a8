//! Incremental, budget-bounded context assembly for AI assistants.
//!
//! `context-assembly` indexes a corpus of rule files and memory-bank pages,
//! expands inclusion directives between them, and answers task descriptions
//! with the most relevant sections that fit a token budget. Indexing is
//! fingerprint-based and incremental; queries run against an immutable
//! snapshot while a background refresh builds the next one. Identical
//! snapshot and query inputs always produce identical selections.

pub mod config;
pub mod document;
pub mod engine;
pub mod fingerprint;
pub mod index;
pub mod selection;
pub mod storage;
pub mod transclusion;
pub mod types;

pub use config::EngineConfig;
pub use engine::{ContextEngine, EngineStats};
