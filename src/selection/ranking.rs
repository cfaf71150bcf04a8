use crate::index::IndexSnapshot;
use crate::types::context_bundle::{Query, ScoredCandidate};

pub use crate::document::tokens::{ApproxTokenCounter, TokenCounter};

pub trait Scorer {
    /// Score every section of `snapshot` against `query`, in snapshot order.
    /// Scores lie in `[0.0, 1.0]`; sections with no query-term overlap score 0.
    fn score<'s>(&self, query: &Query, snapshot: &'s IndexSnapshot) -> Vec<ScoredCandidate<'s>>;
}

/// TF-IDF over sections, normalized by the best raw score of the pass.
///
/// raw(section) = sum over query terms of tf(section, term) * idf(term)
/// idf(term)    = ln(1 + sections / sections_containing(term))
///
/// Query terms are summed in query order, so a fixed snapshot and query
/// always reproduce the same bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct TfIdfScorer;

impl Scorer for TfIdfScorer {
    fn score<'s>(&self, query: &Query, snapshot: &'s IndexSnapshot) -> Vec<ScoredCandidate<'s>> {
        let stats = snapshot.stats();
        let weights: Vec<(&str, f64)> = query
            .terms
            .iter()
            .map(|t| (t.as_str(), stats.inverse_document_frequency(t)))
            .collect();

        let raw: Vec<f64> = snapshot
            .sections()
            .map(|(_, section)| {
                weights
                    .iter()
                    .map(|(term, idf)| f64::from(section.term_frequency(term)) * idf)
                    .sum()
            })
            .collect();

        let max = raw.iter().copied().fold(0.0_f64, f64::max);

        snapshot
            .sections()
            .zip(raw)
            .map(|((document, section), raw)| {
                let score = if max > 0.0 {
                    (raw / max).clamp(0.0, 1.0) as f32
                } else {
                    0.0
                };
                debug_assert!((0.0..=1.0).contains(&score), "score {score} out of range [0.0, 1.0]");
                ScoredCandidate {
                    path: &document.id,
                    version: &document.version,
                    section,
                    score,
                }
            })
            .collect()
    }
}
