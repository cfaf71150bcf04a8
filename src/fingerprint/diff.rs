use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::manifest::FingerprintState;
use crate::types::identifiers::{DocumentId, Fingerprint};

/// Result of comparing the current corpus against the committed state.
/// Every list is sorted by document id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusDiff {
    pub added: Vec<DocumentId>,
    pub changed: Vec<DocumentId>,
    pub removed: Vec<DocumentId>,
    pub unchanged: Vec<DocumentId>,
}

impl CorpusDiff {
    pub fn compute(committed: &FingerprintState, current: &BTreeMap<DocumentId, Fingerprint>) -> Self {
        let mut diff = CorpusDiff::default();

        for (id, version) in current {
            match committed.get(id) {
                None => diff.added.push(id.clone()),
                Some(record) if &record.version != version => diff.changed.push(id.clone()),
                Some(_) => diff.unchanged.push(id.clone()),
            }
        }
        for record in committed.records() {
            if !current.contains_key(&record.id) {
                diff.removed.push(record.id.clone());
            }
        }

        diff
    }

    /// Documents whose content is new, different or gone.
    pub fn dirty(&self) -> BTreeSet<DocumentId> {
        self.added
            .iter()
            .chain(&self.changed)
            .chain(&self.removed)
            .cloned()
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}
