pub mod budgeting;
pub mod ranking;

use crate::index::IndexSnapshot;
use crate::types::context_bundle::{Query, QueryError, SelectionMetadata, SelectionResult};
pub use budgeting::{apply_budget, selection_order, BudgetResult};
pub use ranking::{ApproxTokenCounter, Scorer, TfIdfScorer, TokenCounter};

pub struct ContextSelector<S> {
	scorer: S,
}

impl Default for ContextSelector<TfIdfScorer> {
	fn default() -> Self {
		Self {
			scorer: TfIdfScorer,
		}
	}
}

impl<S> ContextSelector<S>
where
	S: Scorer,
{
	pub fn new(scorer: S) -> Self {
		Self { scorer }
	}

	pub fn select(
		&self,
		snapshot: &IndexSnapshot,
		query: Query,
		max_tokens: usize,
		min_score: f32,
	) -> Result<SelectionResult, QueryError> {
		if !min_score.is_finite() || !(0.0..=1.0).contains(&min_score) {
			return Err(QueryError::InvalidMinScore(min_score));
		}
		if query.is_empty() {
			return Err(QueryError::EmptyQuery);
		}

		// 1. Scoring Phase
		let candidates = self.scorer.score(&query, snapshot);
		let sections_considered = candidates.len();

		// 2. Ordering + Budgeting Phase
		let BudgetResult {
			selected,
			total_tokens,
			total_score,
			sections_excluded_by_score,
			sections_excluded_by_budget,
		} = apply_budget(candidates, max_tokens, min_score);

		debug_assert!(
			selected.windows(2).all(|w| w[0].score >= w[1].score),
			"selection must be ordered by descending score"
		);

		let metadata = SelectionMetadata {
			query: query.raw,
			max_tokens,
			min_score,
			snapshot_version: snapshot.version,
			sections_considered,
			sections_selected: selected.len(),
			sections_excluded_by_score,
			sections_excluded_by_budget,
		};

		Ok(SelectionResult {
			items: selected,
			total_tokens,
			total_score,
			selection: metadata,
		})
	}
}
