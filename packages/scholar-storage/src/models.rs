use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// A vector plus its payload, ready for upsert. The payload always carries
/// the external id so hits can be mapped back without a side table.
#[derive(Debug, Clone)]
pub struct EmbeddingPoint {
	pub external_id: String,
	pub vector: Vec<f32>,
	pub payload: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ScoredMatch {
	pub external_id: String,
	pub score: f32,
	pub payload: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct StoredPoint {
	pub point_id: Uuid,
	pub external_id: String,
	pub payload: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct RecommendationBatch {
	pub batch_id: Uuid,
	pub fingerprint: String,
	pub requester_id: String,
	pub corpus: String,
	pub created_at: OffsetDateTime,
	pub rows: Vec<RecommendationRow>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecommendationRow {
	pub entity_id: String,
	pub score: f32,
	pub justification: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct RecommendationBatchHead {
	pub batch_id: Uuid,
	pub fingerprint: String,
	pub requester_id: String,
	pub corpus: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProfileOutboxEntry {
	pub outbox_id: Uuid,
	pub external_id: String,
	pub op: String,
	pub profile: Option<Value>,
	pub attempts: i32,
}
