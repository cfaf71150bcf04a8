use std::cmp::Ordering;

use crate::types::context_bundle::{ScoredCandidate, SelectedSection};

pub struct BudgetResult {
    pub selected: Vec<SelectedSection>,
    pub total_tokens: usize,
    pub total_score: f32,
    pub sections_excluded_by_score: usize,
    pub sections_excluded_by_budget: usize,
}

/// Selection order: score descending, then token cost ascending, then
/// document path, then section order. This is a total order.
pub fn selection_order(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.tokens().cmp(&b.tokens()))
        .then_with(|| a.path.cmp(b.path))
        .then_with(|| a.section.order.cmp(&b.section.order))
}

/// Greedy budgeted selection.
///
/// Candidates scoring below `min_score` are dropped. The rest are taken in
/// [`selection_order`] while they fit; a candidate that would overflow is
/// skipped and the scan continues, so a later, smaller one may still fit.
///
/// This is a greedy approximation of budgeted maximum-relevance selection,
/// not an optimal knapsack: it runs in `O(n log n)` with no dependence on the
/// budget size, and its output is easy to explain.
pub fn apply_budget(
    mut candidates: Vec<ScoredCandidate<'_>>,
    max_tokens: usize,
    min_score: f32,
) -> BudgetResult {
    let before = candidates.len();
    candidates.retain(|c| c.score >= min_score);
    let sections_excluded_by_score = before - candidates.len();

    candidates.sort_by(selection_order);

    let mut selected = Vec::new();
    let mut total_tokens = 0;
    let mut total_score = 0.0_f32;
    let mut sections_excluded_by_budget = 0;

    for candidate in candidates {
        let tokens = candidate.tokens();
        if total_tokens + tokens <= max_tokens {
            total_tokens += tokens;
            total_score += candidate.score;
            selected.push(SelectedSection {
                path: candidate.path.as_str().to_string(),
                section_heading: candidate.section.heading.clone(),
                section_order: candidate.section.order,
                version: candidate.version.as_str().to_string(),
                score: candidate.score,
                tokens,
                content: candidate.section.content.clone(),
            });
        } else {
            sections_excluded_by_budget += 1;
        }
    }

    debug_assert!(total_tokens <= max_tokens);

    BudgetResult {
        selected,
        total_tokens,
        total_score,
        sections_excluded_by_score,
        sections_excluded_by_budget,
    }
}
