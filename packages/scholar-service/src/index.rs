use std::collections::HashMap;

use serde_json::{Map, Value};

use scholar_domain::{EntityType, Profile, RejectCode, index_gate, text};
use scholar_storage::models::EmbeddingPoint;

use crate::{EmbeddingKind, Error, MatchService, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
	Indexed,
	/// The profile fell out of eligibility; its stored vector was deleted.
	Removed { reason: RejectCode },
	/// The profile is ineligible and nothing was indexed for it before.
	Skipped { reason: RejectCode },
	/// No vector store is configured; the engine runs in no-index mode.
	Unavailable,
}

#[derive(Debug, Default)]
pub struct ReindexReport {
	pub indexed: usize,
	pub removed: usize,
	pub failed: usize,
}

impl MatchService {
	/// Embeds and upserts one profile, or deletes its vector if the profile
	/// fell out of eligibility. Embedding failures are returned as errors so
	/// queue-driven callers retry instead of silently losing the write.
	pub async fn upsert_profile(&self, profile: &Profile) -> Result<IndexOutcome> {
		let Some(index) = self.index.as_ref() else {
			tracing::warn!("No vector store configured, skipping profile indexing.");

			return Ok(IndexOutcome::Unavailable);
		};
		let entity = profile.entity_type();
		let collection = self.collection_for(entity);

		if let Err(reason) = index_gate(profile, &self.cfg.gate) {
			let stored =
				index.find_by_external_id(&collection, profile.external_id()).await?;

			if stored.is_none() {
				tracing::debug!(
					entity_id = %profile.external_id(),
					reason = ?reason,
					"Profile is ineligible for indexing, nothing stored to remove.",
				);

				return Ok(IndexOutcome::Skipped { reason });
			}

			tracing::info!(
				entity_id = %profile.external_id(),
				reason = ?reason,
				"Profile became ineligible, removing its stored vector.",
			);
			index.delete(&collection, profile.external_id()).await?;

			return Ok(IndexOutcome::Removed { reason });
		}

		let point = self.embed_profile(profile).await?;

		index.ensure_collection(&collection).await?;
		index.upsert(&collection, point).await?;

		Ok(IndexOutcome::Indexed)
	}

	pub async fn remove_profile(&self, entity: EntityType, external_id: &str) -> Result<()> {
		let Some(index) = self.index.as_ref() else {
			tracing::warn!("No vector store configured, nothing to remove.");

			return Ok(());
		};
		let collection = self.collection_for(entity);

		index.delete(&collection, external_id).await?;

		Ok(())
	}

	/// Bulk re-embedding, grouped into one batch upsert per collection.
	pub async fn reindex(&self, profiles: &[Profile]) -> Result<ReindexReport> {
		let Some(index) = self.index.as_ref() else {
			tracing::warn!("No vector store configured, skipping reindex.");

			return Ok(ReindexReport::default());
		};
		let mut report = ReindexReport::default();
		let mut grouped: HashMap<String, Vec<EmbeddingPoint>> = HashMap::new();

		for profile in profiles {
			let collection = self.collection_for(profile.entity_type());

			if let Err(reason) = index_gate(profile, &self.cfg.gate) {
				tracing::info!(
					entity_id = %profile.external_id(),
					reason = ?reason,
					"Skipping ineligible profile during reindex.",
				);
				index.delete(&collection, profile.external_id()).await?;
				report.removed += 1;

				continue;
			}

			match self.embed_profile(profile).await {
				Ok(point) => {
					grouped.entry(collection).or_default().push(point);
					report.indexed += 1;
				},
				Err(err) => {
					tracing::warn!(
						entity_id = %profile.external_id(),
						error = %err,
						"Failed to embed profile during reindex.",
					);
					report.failed += 1;
				},
			}
		}

		for (collection, points) in grouped {
			index.ensure_collection(&collection).await?;
			index.upsert_batch(&collection, points).await?;
		}

		Ok(report)
	}

	async fn embed_profile(&self, profile: &Profile) -> Result<EmbeddingPoint> {
		let document = text::build_document(profile, &self.taxonomy, &self.cfg.text);
		let vector = self
			.embedder()
			.embed(
				&self.cfg,
				self.providers.embedding.as_ref(),
				&document,
				EmbeddingKind::Document,
			)
			.await
			.ok_or_else(|| Error::Provider {
				message: format!("No vector for profile {}.", profile.external_id()),
			})?;

		Ok(EmbeddingPoint {
			external_id: profile.external_id().to_string(),
			vector,
			payload: profile_payload(profile),
		})
	}
}

fn profile_payload(profile: &Profile) -> Map<String, Value> {
	let mut payload = Map::new();

	payload.insert(
		"entity_type".to_string(),
		Value::String(profile.entity_type().as_str().to_string()),
	);
	payload.insert("name".to_string(), Value::String(profile.name().to_string()));

	if let Some(institution) = profile.institution() {
		payload.insert("institution".to_string(), Value::String(institution.to_string()));
	}
	if let Some(program_type) = profile.program_type() {
		payload.insert("program_type".to_string(), Value::String(program_type.to_string()));
	}

	payload
}
