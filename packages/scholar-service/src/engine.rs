use std::time::Duration as StdDuration;

use tokio::time::timeout;

use scholar_config::Matching;
use scholar_domain::{EntityType, Profile, QueryClass, classify_query, text};

use crate::{
	EmbeddingKind, MatchService, Result, ranking,
	ranking::MatchResult,
};

#[derive(Debug, Clone)]
pub struct MatchRequest {
	pub query: String,
	pub requester: Option<Profile>,
	pub target: EntityType,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
	ProfileOnly,
	QueryOnly,
	Blended,
	NoSignal,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
	pub results: Vec<MatchResult>,
	pub strategy: Strategy,
	pub classification: QueryClass,
	pub threshold_used: f32,
}

/// The sequence of thresholds a search attempts. Specific queries that
/// started in the high-precision regime step down once before hitting the
/// floor; vague queries already run at a low floor and never back off.
pub fn backoff_ladder(initial: f32, classification: QueryClass, cfg: &Matching) -> Vec<f32> {
	let mut ladder = vec![initial];

	if classification == QueryClass::Vague {
		return ladder;
	}

	if initial >= cfg.specific_regime_min {
		ladder.push(cfg.backoff_mid_threshold);
	}

	ladder.push(cfg.backoff_floor_threshold);
	// Keep the ladder strictly decreasing; a retry at the same or a higher
	// floor cannot produce new results.
	ladder.dedup_by(|next, prev| *next >= *prev);

	ladder
}

impl MatchService {
	pub async fn find_matches(&self, req: &MatchRequest) -> Result<MatchOutcome> {
		let classification = classify_query(&req.query, &self.cfg.heuristics);
		let limit = req.limit.unwrap_or(self.cfg.matching.top_k);
		let cache_key = request_cache_key(req, limit);

		if let Some(outcome) = self.results_cache().get(&cache_key) {
			return Ok(outcome);
		}

		let profile_vector = match &req.requester {
			Some(requester) => {
				let document = text::build_document(requester, &self.taxonomy, &self.cfg.text);

				self.embedder()
					.embed(
						&self.cfg,
						self.providers.embedding.as_ref(),
						&document,
						EmbeddingKind::Document,
					)
					.await
			},
			None => None,
		};
		// A vague query carries no standalone signal, so its embedding is only
		// worth computing when there is no profile vector to fall back on.
		let query_vector = if classification == QueryClass::Specific || profile_vector.is_none() {
			self.embedder()
				.embed(
					&self.cfg,
					self.providers.embedding.as_ref(),
					&req.query,
					EmbeddingKind::Query,
				)
				.await
		} else {
			None
		};
		let strategy = match (&profile_vector, &query_vector) {
			(Some(_), Some(_)) => Strategy::Blended,
			(Some(_), None) => Strategy::ProfileOnly,
			(None, Some(_)) => Strategy::QueryOnly,
			(None, None) => Strategy::NoSignal,
		};

		if strategy == Strategy::NoSignal {
			tracing::warn!(entity = %req.target.as_str(), "No usable signal for match request.");

			return Ok(MatchOutcome {
				results: Vec::new(),
				strategy,
				classification,
				threshold_used: 0.0,
			});
		}

		let initial = if classification == QueryClass::Vague {
			self.cfg.matching.vague_score_threshold
		} else {
			self.cfg.matching.default_score_threshold
		};
		let ladder = backoff_ladder(initial, classification, &self.cfg.matching);
		let mut results = Vec::new();
		let mut threshold_used = initial;

		for threshold in ladder {
			threshold_used = threshold;
			results = match strategy {
				Strategy::Blended => {
					let query_vector = query_vector.as_deref().unwrap_or_default();
					let profile_vector = profile_vector.as_deref().unwrap_or_default();
					// Two independent signals, two independent searches: run
					// them concurrently and blend scores afterwards.
					let (query_hits, profile_hits) = tokio::join!(
						self.search_signal(req.target, query_vector, limit, threshold),
						self.search_signal(req.target, profile_vector, limit, threshold),
					);

					ranking::merge(
						&query_hits,
						self.cfg.matching.query_weight,
						&profile_hits,
						self.cfg.matching.profile_weight,
					)
				},
				Strategy::ProfileOnly => {
					let vector = profile_vector.as_deref().unwrap_or_default();

					self.search_signal(req.target, vector, limit, threshold).await
				},
				Strategy::QueryOnly => {
					let vector = query_vector.as_deref().unwrap_or_default();

					self.search_signal(req.target, vector, limit, threshold).await
				},
				Strategy::NoSignal => Vec::new(),
			};

			if !results.is_empty() {
				break;
			}

			tracing::debug!(
				threshold = threshold,
				"Zero results at this similarity floor, backing off.",
			);
		}

		results.truncate(limit as usize);

		let outcome = MatchOutcome { results, strategy, classification, threshold_used };

		self.results_cache().put(cache_key, outcome.clone());

		Ok(outcome)
	}

	/// One similarity search for one signal. Store errors degrade to the
	/// brute-force scan; a timeout degrades to "no hits from this signal" so
	/// the other signal still completes.
	async fn search_signal(
		&self,
		target: EntityType,
		vector: &[f32],
		limit: u32,
		score_threshold: f32,
	) -> Vec<MatchResult> {
		if vector.is_empty() {
			return Vec::new();
		}

		let Some(index) = self.index.as_ref() else {
			return self.brute_force_search(target, vector, limit, score_threshold).await;
		};
		let collection = self.collection_for(target);
		let deadline = StdDuration::from_millis(self.cfg.matching.search_timeout_ms);

		match timeout(deadline, index.search(&collection, vector, limit, score_threshold)).await {
			Ok(Ok(hits)) => hits
				.into_iter()
				.map(|hit| MatchResult { entity_id: hit.external_id, score: hit.score })
				.collect(),
			Ok(Err(err)) => {
				tracing::warn!(
					error = %err,
					collection = %collection,
					"Vector store search failed, falling back to brute force.",
				);

				self.brute_force_search(target, vector, limit, score_threshold).await
			},
			Err(_) => {
				tracing::warn!(
					collection = %collection,
					timeout_ms = self.cfg.matching.search_timeout_ms,
					"Vector store search timed out, dropping this signal.",
				);

				Vec::new()
			},
		}
	}
}

fn request_cache_key(req: &MatchRequest, limit: u32) -> String {
	let payload = serde_json::json!({
		"query": req.query.trim(),
		"requester_id": req.requester.as_ref().map(|profile| profile.external_id()),
		"target": req.target.as_str(),
		"limit": limit,
	});
	let raw = serde_json::to_vec(&payload).unwrap_or_default();

	blake3::hash(&raw).to_hex().to_string()
}
