mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, EmbeddingProviderConfig, Gate, Heuristics, LlmProviderConfig, Matching,
	Postgres, Providers, Qdrant, Service, Storage, Taxonomy, Text,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection_prefix.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection_prefix must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("justification", &cfg.providers.justification.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, weight) in [
		("matching.query_weight", cfg.matching.query_weight),
		("matching.profile_weight", cfg.matching.profile_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(0.0..=1.0).contains(&weight) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}
	if cfg.matching.query_weight + cfg.matching.profile_weight <= 0.0 {
		return Err(Error::Validation {
			message: "matching.query_weight and matching.profile_weight must not both be zero."
				.to_string(),
		});
	}

	for (label, threshold) in [
		("matching.default_score_threshold", cfg.matching.default_score_threshold),
		("matching.vague_score_threshold", cfg.matching.vague_score_threshold),
		("matching.backoff_mid_threshold", cfg.matching.backoff_mid_threshold),
		("matching.backoff_floor_threshold", cfg.matching.backoff_floor_threshold),
		("matching.specific_regime_min", cfg.matching.specific_regime_min),
	] {
		if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}
	if cfg.matching.backoff_mid_threshold < cfg.matching.backoff_floor_threshold {
		return Err(Error::Validation {
			message:
				"matching.backoff_mid_threshold must not be below matching.backoff_floor_threshold."
					.to_string(),
		});
	}
	if cfg.matching.vague_score_threshold > cfg.matching.default_score_threshold {
		return Err(Error::Validation {
			message:
				"matching.vague_score_threshold must not exceed matching.default_score_threshold."
					.to_string(),
		});
	}
	if cfg.matching.top_k == 0 {
		return Err(Error::Validation {
			message: "matching.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.matching.search_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "matching.search_timeout_ms must be greater than zero.".to_string(),
		});
	}

	if cfg.text.max_tokens == 0 {
		return Err(Error::Validation {
			message: "text.max_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.text.interest_labels.is_empty() {
		return Err(Error::Validation {
			message: "text.interest_labels must be non-empty.".to_string(),
		});
	}

	if cfg.heuristics.short_query_max_words == 0 {
		return Err(Error::Validation {
			message: "heuristics.short_query_max_words must be greater than zero.".to_string(),
		});
	}

	if cfg.cache.embedding_ttl_days <= 0 {
		return Err(Error::Validation {
			message: "cache.embedding_ttl_days must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.results_ttl_minutes <= 0 {
		return Err(Error::Validation {
			message: "cache.results_ttl_minutes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.qdrant.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.storage.qdrant.api_key = None;
	}

	for list in [
		&mut cfg.heuristics.vague_patterns,
		&mut cfg.heuristics.domain_keywords,
		&mut cfg.heuristics.supervisor_keywords,
		&mut cfg.heuristics.collaborator_keywords,
		&mut cfg.heuristics.student_keywords,
		&mut cfg.gate.default_avatars,
		&mut cfg.text.interest_labels,
	] {
		list.retain(|entry| !entry.trim().is_empty());
	}
}
