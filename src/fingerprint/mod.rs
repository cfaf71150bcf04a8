//! Durable record of every document's content fingerprint, token count and
//! section boundaries: the ground truth for "has this changed".

pub mod diff;
pub mod manifest;
pub mod store;

pub use diff::CorpusDiff;
pub use manifest::{
    FingerprintManifest, FingerprintRecord, FingerprintState, ManifestFormat, SectionBoundary,
};
pub use store::{FingerprintStore, LoadOutcome, StoreError};
