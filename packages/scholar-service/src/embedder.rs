use time::Duration;

use scholar_config::Config;
use scholar_domain::{query, text};
use scholar_providers::cache::{TtlCache, content_key};

use crate::EmbeddingProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingKind {
	Document,
	Query,
}

/// Cache-fronted embedding access. This boundary never propagates provider
/// failures: every problem becomes "no vector" so callers can degrade to
/// fewer signals instead of failing the request.
pub struct Embedder {
	cache: TtlCache<Vec<f32>>,
}
impl Embedder {
	pub fn new(ttl: Duration) -> Self {
		Self { cache: TtlCache::new(ttl) }
	}

	pub async fn embed(
		&self,
		cfg: &Config,
		provider: &dyn EmbeddingProvider,
		raw_text: &str,
		kind: EmbeddingKind,
	) -> Option<Vec<f32>> {
		let normalized = text::normalize_text(raw_text);

		if normalized.is_empty() {
			tracing::debug!("Empty text after normalization, no vector.");

			return None;
		}

		let input = match kind {
			EmbeddingKind::Document => normalized,
			EmbeddingKind::Query => query::enhance_query(&normalized, &cfg.heuristics),
		};
		let key = content_key(&cfg.providers.embedding.model, &input);

		if let Some(vector) = self.cache.get(&key) {
			return Some(vector);
		}

		let texts = vec![input];

		match provider.embed(&cfg.providers.embedding, &texts).await {
			Ok(mut vectors) if !vectors.is_empty() => {
				let vector = vectors.swap_remove(0);

				if vector.is_empty() {
					tracing::warn!("Embedding provider returned an empty vector.");

					return None;
				}

				self.cache.put(key, vector.clone());

				Some(vector)
			},
			Ok(_) => {
				tracing::warn!("Embedding provider returned no vectors.");

				None
			},
			Err(err) if err.is_configuration() => {
				tracing::error!(
					error = %err,
					model = %cfg.providers.embedding.model,
					"Embedding provider configuration problem, running without vectors.",
				);

				None
			},
			Err(err) => {
				tracing::warn!(error = %err, "Embedding request failed, no vector.");

				None
			},
		}
	}

	pub fn cached_vector_count(&self) -> usize {
		self.cache.len()
	}
}
