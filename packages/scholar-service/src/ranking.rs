use std::{cmp::Ordering, collections::HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
	pub entity_id: String,
	pub score: f32,
}

/// Blends two independently scored result sets by accumulating weighted
/// scores per entity. Scores are blended rather than vectors: averaging
/// vectors before search can cancel orthogonal signal directions.
pub fn merge(
	a: &[MatchResult],
	weight_a: f32,
	b: &[MatchResult],
	weight_b: f32,
) -> Vec<MatchResult> {
	let mut accumulated: HashMap<&str, f32> = HashMap::with_capacity(a.len() + b.len());

	for result in a {
		*accumulated.entry(result.entity_id.as_str()).or_insert(0.0) += result.score * weight_a;
	}
	for result in b {
		*accumulated.entry(result.entity_id.as_str()).or_insert(0.0) += result.score * weight_b;
	}

	let mut out: Vec<MatchResult> = accumulated
		.into_iter()
		.map(|(entity_id, score)| MatchResult { entity_id: entity_id.to_string(), score })
		.collect();

	sort_results(&mut out);

	out
}

/// Descending by score, ties broken by entity id so orderings are stable
/// across runs.
pub fn sort_results(results: &mut [MatchResult]) {
	results.sort_by(|left, right| {
		cmp_score_desc(left.score, right.score)
			.then_with(|| left.entity_id.cmp(&right.entity_id))
	});
}

pub fn cmp_score_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
