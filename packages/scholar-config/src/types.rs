use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub matching: Matching,
	#[serde(default)]
	pub text: Text,
	#[serde(default)]
	pub heuristics: Heuristics,
	#[serde(default)]
	pub gate: Gate,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub taxonomy: Taxonomy,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub api_key: Option<String>,
	pub collection_prefix: String,
	pub vector_dim: u32,
	pub timeout_ms: u64,
	#[serde(default = "default_replication_factor")]
	pub replication_factor: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub justification: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Weights and thresholds are empirically tuned defaults. Changing them
/// changes which matches surface, not whether the engine works.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Matching {
	pub query_weight: f32,
	pub profile_weight: f32,
	pub default_score_threshold: f32,
	pub vague_score_threshold: f32,
	pub backoff_mid_threshold: f32,
	pub backoff_floor_threshold: f32,
	pub specific_regime_min: f32,
	pub top_k: u32,
	pub search_timeout_ms: u64,
}
impl Default for Matching {
	fn default() -> Self {
		Self {
			query_weight: 0.6,
			profile_weight: 0.4,
			default_score_threshold: 0.5,
			vague_score_threshold: 0.3,
			backoff_mid_threshold: 0.35,
			backoff_floor_threshold: 0.2,
			specific_regime_min: 0.5,
			top_k: 10,
			search_timeout_ms: 15_000,
		}
	}
}

/// The repeated interest labels bias the embedding toward the primary
/// research-interest signal. The label set and repetition count are
/// compatibility-bearing: stored vectors were produced with these exact
/// labels.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Text {
	pub max_tokens: u32,
	pub interest_labels: Vec<String>,
}
impl Default for Text {
	fn default() -> Self {
		Self {
			max_tokens: 8_000,
			interest_labels: vec![
				"Research Expertise".to_string(),
				"Research Focus".to_string(),
				"Research Specialty".to_string(),
			],
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Heuristics {
	pub vague_patterns: Vec<String>,
	pub domain_keywords: Vec<String>,
	pub supervisor_keywords: Vec<String>,
	pub collaborator_keywords: Vec<String>,
	pub student_keywords: Vec<String>,
	pub short_query_max_words: u32,
}
impl Default for Heuristics {
	fn default() -> Self {
		Self {
			vague_patterns: vec![
				"find me a supervisor".to_string(),
				"find supervisor".to_string(),
				"for me".to_string(),
				"my profile".to_string(),
				"recommend me".to_string(),
				"suitable for me".to_string(),
			],
			domain_keywords: vec![
				"machine learning".to_string(),
				"artificial intelligence".to_string(),
				"education".to_string(),
				"engineering".to_string(),
				"medicine".to_string(),
				"biology".to_string(),
				"chemistry".to_string(),
				"physics".to_string(),
				"mathematics".to_string(),
				"economics".to_string(),
				"linguistics".to_string(),
				"psychology".to_string(),
			],
			supervisor_keywords: vec!["supervisor".to_string(), "advisor".to_string()],
			collaborator_keywords: vec!["collaborat".to_string(), "co-author".to_string()],
			student_keywords: vec!["student".to_string(), "candidate".to_string()],
			short_query_max_words: 3,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gate {
	pub default_avatars: Vec<String>,
}
impl Default for Gate {
	fn default() -> Self {
		Self {
			default_avatars: vec!["default.png".to_string(), "default-avatar.png".to_string()],
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub embedding_ttl_days: i64,
	pub results_ttl_minutes: i64,
}
impl Default for Cache {
	fn default() -> Self {
		Self { embedding_ttl_days: 30, results_ttl_minutes: 10 }
	}
}

/// Maps `field-area-domain` triplet ids to hierarchical human-readable
/// names, e.g. `"3-12-7" -> "Engineering > Computing > Machine Learning"`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
	pub terms: HashMap<String, String>,
}

fn default_replication_factor() -> u32 {
	1
}
