use std::time::Duration;

use reqwest::{
	Client, StatusCode,
	header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::Value;

use crate::{
	Error, Result,
	models::{EmbeddingPoint, ScoredMatch, StoredPoint},
	point_id,
};

/// Vector store client speaking the Qdrant HTTP API. Collection creation is
/// check-then-create and never destructive; the similarity floor is always
/// enforced server-side so vector-store mode and brute-force mode filter
/// identically.
pub struct QdrantStore {
	http: Client,
	base_url: String,
	api_key: Option<String>,
	pub collection_prefix: String,
	pub vector_dim: u32,
	replication_factor: u32,
}
impl QdrantStore {
	pub fn new(cfg: &scholar_config::Qdrant) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;

		Ok(Self {
			http,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			api_key: cfg.api_key.clone(),
			collection_prefix: cfg.collection_prefix.clone(),
			vector_dim: cfg.vector_dim,
			replication_factor: cfg.replication_factor,
		})
	}

	fn headers(&self) -> Result<HeaderMap> {
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		if let Some(key) = &self.api_key {
			headers.insert(
				HeaderName::from_static("api-key"),
				HeaderValue::from_str(key)
					.map_err(|_| Error::InvalidArgument("Invalid Qdrant api key.".to_string()))?,
			);
		}

		Ok(headers)
	}

	pub async fn is_reachable(&self) -> bool {
		let url = format!("{}/collections", self.base_url);
		let Ok(headers) = self.headers() else { return false };

		match self.http.get(url).headers(headers).send().await {
			Ok(res) => res.status().is_success(),
			Err(err) => {
				tracing::warn!(error = %err, "Vector store is unreachable.");

				false
			},
		}
	}

	pub async fn collection_exists(&self, collection: &str) -> Result<bool> {
		let url = format!("{}/collections/{collection}", self.base_url);
		let res = self.http.get(url).headers(self.headers()?).send().await?;

		match res.status() {
			status if status.is_success() => Ok(true),
			StatusCode::NOT_FOUND => Ok(false),
			status => Err(Error::Qdrant {
				status: status.as_u16(),
				message: res.text().await.unwrap_or_default(),
			}),
		}
	}

	pub async fn ensure_collection(&self, collection: &str) -> Result<()> {
		if self.collection_exists(collection).await? {
			return Ok(());
		}

		let url = format!("{}/collections/{collection}", self.base_url);
		let body = serde_json::json!({
			"vectors": { "size": self.vector_dim, "distance": "Cosine" },
			"optimizers_config": { "default_segment_number": 2 },
			"replication_factor": self.replication_factor,
		});
		let res = self.http.put(url).headers(self.headers()?).json(&body).send().await?;

		match res.status() {
			status if status.is_success() => Ok(()),
			// Another writer created it between the probe and the PUT.
			StatusCode::CONFLICT => Ok(()),
			status => Err(Error::Qdrant {
				status: status.as_u16(),
				message: res.text().await.unwrap_or_default(),
			}),
		}
	}

	pub async fn upsert(&self, collection: &str, point: EmbeddingPoint) -> Result<()> {
		self.upsert_batch(collection, vec![point]).await
	}

	pub async fn upsert_batch(&self, collection: &str, points: Vec<EmbeddingPoint>) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}

		let url = format!("{}/collections/{collection}/points?wait=true", self.base_url);
		let encoded: Vec<Value> = points.into_iter().map(encode_point).collect();
		let body = serde_json::json!({ "points": encoded });
		let res = self.http.put(url).headers(self.headers()?).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(Error::Qdrant {
				status: status.as_u16(),
				message: res.text().await.unwrap_or_default(),
			});
		}

		Ok(())
	}

	pub async fn search(
		&self,
		collection: &str,
		vector: &[f32],
		limit: u32,
		score_threshold: f32,
	) -> Result<Vec<ScoredMatch>> {
		let url = format!("{}/collections/{collection}/points/search", self.base_url);
		let body = serde_json::json!({
			"vector": vector,
			"limit": limit,
			"with_payload": true,
			"with_vector": false,
			"score_threshold": score_threshold,
		});
		let res = self.http.post(url).headers(self.headers()?).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(Error::Qdrant {
				status: status.as_u16(),
				message: res.text().await.unwrap_or_default(),
			});
		}

		let json: Value = res.json().await?;

		Ok(parse_search_response(&json))
	}

	pub async fn find_by_external_id(
		&self,
		collection: &str,
		external_id: &str,
	) -> Result<Option<StoredPoint>> {
		let url = format!("{}/collections/{collection}/points/scroll", self.base_url);
		let body = serde_json::json!({
			"filter": {
				"must": [
					{ "key": "external_id", "match": { "value": external_id } }
				]
			},
			"limit": 1,
			"with_payload": true,
			"with_vector": false,
		});
		let res = self.http.post(url).headers(self.headers()?).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(Error::Qdrant {
				status: status.as_u16(),
				message: res.text().await.unwrap_or_default(),
			});
		}

		let json: Value = res.json().await?;

		Ok(parse_scroll_response(&json))
	}

	pub async fn delete(&self, collection: &str, external_id: &str) -> Result<()> {
		let url = format!("{}/collections/{collection}/points/delete?wait=true", self.base_url);
		let body = serde_json::json!({
			"points": [point_id::derive(external_id)],
		});
		let res = self.http.post(url).headers(self.headers()?).json(&body).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(Error::Qdrant {
				status: status.as_u16(),
				message: res.text().await.unwrap_or_default(),
			});
		}

		Ok(())
	}
}

fn encode_point(point: EmbeddingPoint) -> Value {
	let mut payload = point.payload;

	// The external id must survive in the payload for reverse lookup.
	payload.insert("external_id".to_string(), Value::String(point.external_id.clone()));

	serde_json::json!({
		"id": point_id::derive(&point.external_id),
		"vector": point.vector,
		"payload": payload,
	})
}

/// Hits missing their mapped identifier are data errors: skip the record,
/// never abort the search.
fn parse_search_response(json: &Value) -> Vec<ScoredMatch> {
	let Some(result) = json.get("result").and_then(|v| v.as_array()) else {
		tracing::warn!("Search response is missing result array.");

		return Vec::new();
	};

	let mut out = Vec::with_capacity(result.len());

	for hit in result {
		let payload =
			hit.get("payload").and_then(|v| v.as_object()).cloned().unwrap_or_default();
		let Some(external_id) =
			payload.get("external_id").and_then(|v| v.as_str()).map(str::to_string)
		else {
			tracing::warn!("Search hit payload is missing external_id, skipping.");

			continue;
		};
		let Some(score) = hit.get("score").and_then(|v| v.as_f64()) else {
			tracing::warn!(external_id = %external_id, "Search hit is missing score, skipping.");

			continue;
		};

		out.push(ScoredMatch { external_id, score: score as f32, payload });
	}

	out
}

fn parse_scroll_response(json: &Value) -> Option<StoredPoint> {
	let point = json
		.get("result")
		.and_then(|v| v.get("points"))
		.and_then(|v| v.as_array())
		.and_then(|points| points.first())?;
	let point_id = point.get("id").and_then(|v| v.as_str()).and_then(|id| id.parse().ok())?;
	let payload = point.get("payload").and_then(|v| v.as_object()).cloned().unwrap_or_default();
	let external_id = payload.get("external_id").and_then(|v| v.as_str())?.to_string();

	Some(StoredPoint { point_id, external_id, payload })
}
