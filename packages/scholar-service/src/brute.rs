use scholar_domain::{EntityType, similarity, text};

use crate::{EmbeddingKind, MatchService, ranking, ranking::MatchResult};

impl MatchService {
	/// Degraded-mode search: score every complete profile of the target type
	/// in application code. Threshold semantics are identical to the vector
	/// store path so result quality does not depend on which backend served
	/// the request.
	pub(crate) async fn brute_force_search(
		&self,
		target: EntityType,
		vector: &[f32],
		limit: u32,
		score_threshold: f32,
	) -> Vec<MatchResult> {
		let Some(profiles) = self.profiles.as_ref() else {
			tracing::warn!(
				"No vector store and no profile source configured, returning no matches.",
			);

			return Vec::new();
		};
		let candidates = match profiles.complete_profiles(target).await {
			Ok(candidates) => candidates,
			Err(err) => {
				tracing::warn!(error = %err, "Profile source failed during brute-force scan.");

				return Vec::new();
			},
		};
		let mut out = Vec::new();

		for candidate in &candidates {
			if !candidate.is_complete() {
				continue;
			}

			let document = text::build_document(candidate, &self.taxonomy, &self.cfg.text);
			let Some(candidate_vector) = self
				.embedder()
				.embed(&self.cfg, self.providers.embedding.as_ref(), &document, EmbeddingKind::Document)
				.await
			else {
				tracing::warn!(
					entity_id = %candidate.external_id(),
					"Skipping candidate without an embedding.",
				);

				continue;
			};
			let score = similarity::cosine(vector, &candidate_vector);

			if score >= score_threshold {
				out.push(MatchResult { entity_id: candidate.external_id().to_string(), score });
			}
		}

		ranking::sort_results(&mut out);
		out.truncate(limit as usize);

		out
	}
}
