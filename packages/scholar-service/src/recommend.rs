use time::OffsetDateTime;
use uuid::Uuid;

use scholar_domain::{EntityType, Profile, text};
use scholar_storage::models::{RecommendationBatch, RecommendationRow};

use crate::{MatchRequest, MatchService, Result, ranking::MatchResult};

#[derive(Debug, Clone)]
pub struct RecommendRequest {
	pub requester: Profile,
	pub query: String,
	pub target: EntityType,
	/// Identifies the corpus the requester is being matched against, e.g. a
	/// grant call or intake batch. A new corpus means a new fingerprint.
	pub corpus: String,
	pub program_type: Option<String>,
	pub limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Recommendation {
	pub batch: RecommendationBatch,
	/// True when the batch was served from storage instead of recomputed.
	pub reused: bool,
}

/// Deterministic digest of everything that defines a recommendation run.
/// The content hash of the requester's canonical text is part of the key:
/// an updated profile or CV produces a new fingerprint, and only a new
/// fingerprint triggers recomputation.
pub fn fingerprint(req: &RecommendRequest, canonical_text: &str) -> String {
	let payload = serde_json::json!({
		"requester_id": req.requester.external_id(),
		"corpus": req.corpus,
		"target": req.target.as_str(),
		"content_hash": blake3::hash(canonical_text.as_bytes()).to_hex().to_string(),
		"query": req.query.trim(),
		"program_type": req.program_type,
	});
	let raw = serde_json::to_vec(&payload).unwrap_or_default();

	blake3::hash(&raw).to_hex().to_string()
}

impl MatchService {
	/// At-most-one expensive computation per fingerprint. The per-key lock
	/// makes concurrent duplicates wait; the persisted batch makes repeats
	/// across restarts a lookup instead of a recompute.
	pub async fn recommend(&self, req: &RecommendRequest) -> Result<Recommendation> {
		let canonical_text = text::build_document(&req.requester, &self.taxonomy, &self.cfg.text);
		let fingerprint = fingerprint(req, &canonical_text);
		let _flight = self.guard().acquire(&fingerprint).await;

		if let Some(batch) = self.batches.find(&fingerprint).await? {
			return Ok(Recommendation { batch, reused: true });
		}

		let outcome = self
			.find_matches(&MatchRequest {
				query: req.query.clone(),
				requester: Some(req.requester.clone()),
				target: req.target,
				limit: req.limit,
			})
			.await?;
		let mut rows = Vec::with_capacity(outcome.results.len());

		for result in &outcome.results {
			let justification = self.justify_match(req, result).await;

			rows.push(RecommendationRow {
				entity_id: result.entity_id.clone(),
				score: result.score,
				justification,
			});
		}

		let batch = RecommendationBatch {
			batch_id: Uuid::new_v4(),
			fingerprint: fingerprint.clone(),
			requester_id: req.requester.external_id().to_string(),
			corpus: req.corpus.clone(),
			created_at: OffsetDateTime::now_utc(),
			rows,
		};

		if !self.batches.insert(&batch).await? {
			// Another instance persisted the same fingerprint first; theirs
			// is the batch of record.
			if let Some(existing) = self.batches.find(&fingerprint).await? {
				return Ok(Recommendation { batch: existing, reused: true });
			}
		}

		Ok(Recommendation { batch, reused: false })
	}

	/// Prose is optional: a failed or empty justification never blocks the
	/// ranked result.
	async fn justify_match(&self, req: &RecommendRequest, result: &MatchResult) -> Option<String> {
		let interests = self.taxonomy.resolve_all(req.requester.interest_ids());
		let context = serde_json::json!({
			"requester": {
				"name": req.requester.name(),
				"interests": interests,
			},
			"candidate_id": result.entity_id,
			"score": result.score,
			"target": req.target.as_str(),
		});

		match self
			.providers
			.justification
			.justify(&self.cfg.providers.justification, &context)
			.await
		{
			Ok(justification) => Some(justification),
			Err(err) => {
				tracing::warn!(
					entity_id = %result.entity_id,
					error = %err,
					"Justification provider failed, omitting prose.",
				);

				None
			},
		}
	}
}
