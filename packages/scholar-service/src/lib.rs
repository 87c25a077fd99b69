pub mod brute;
pub mod embedder;
pub mod engine;
pub mod index;
pub mod ranking;
pub mod recommend;
pub mod single_flight;

mod error;

pub use error::Error;

pub use embedder::{Embedder, EmbeddingKind};
pub use engine::{MatchOutcome, MatchRequest, Strategy};
pub use index::IndexOutcome;
pub use ranking::MatchResult;
pub use recommend::{RecommendRequest, Recommendation};

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use sqlx::PgPool;
use time::Duration;

use scholar_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use scholar_domain::{EntityType, Profile, TaxonomyResolver};
use scholar_providers::{cache::TtlCache, embedding, justification};
use scholar_storage::{
	batches,
	models::{EmbeddingPoint, RecommendationBatch, ScoredMatch, StoredPoint},
	qdrant::QdrantStore,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, scholar_providers::Result<Vec<Vec<f32>>>>;
}

pub trait JustificationProvider
where
	Self: Send + Sync,
{
	fn justify<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		context: &'a Value,
	) -> BoxFuture<'a, scholar_providers::Result<String>>;
}

/// Object-safe seam over the vector index so the engine can run against the
/// real store or an in-memory double with identical semantics.
pub trait VectorIndex
where
	Self: Send + Sync,
{
	fn ensure_collection<'a>(
		&'a self,
		collection: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>>;
	fn upsert<'a>(
		&'a self,
		collection: &'a str,
		point: EmbeddingPoint,
	) -> BoxFuture<'a, scholar_storage::Result<()>>;
	fn upsert_batch<'a>(
		&'a self,
		collection: &'a str,
		points: Vec<EmbeddingPoint>,
	) -> BoxFuture<'a, scholar_storage::Result<()>>;
	fn search<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		limit: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<ScoredMatch>>>;
	fn find_by_external_id<'a>(
		&'a self,
		collection: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<StoredPoint>>>;
	fn delete<'a>(
		&'a self,
		collection: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>>;
	fn is_reachable<'a>(&'a self) -> BoxFuture<'a, bool>;
}

pub trait BatchStore
where
	Self: Send + Sync,
{
	fn find<'a>(
		&'a self,
		fingerprint: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<RecommendationBatch>>>;
	fn insert<'a>(
		&'a self,
		batch: &'a RecommendationBatch,
	) -> BoxFuture<'a, scholar_storage::Result<bool>>;
}

/// The CRUD layer owns profiles; the engine only ever reads complete ones,
/// and only when brute-force matching has to scan the corpus.
pub trait ProfileSource
where
	Self: Send + Sync,
{
	fn complete_profiles<'a>(
		&'a self,
		entity: EntityType,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<Profile>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub justification: Arc<dyn JustificationProvider>,
}
impl Providers {
	pub fn http() -> Self {
		Self { embedding: Arc::new(HttpProviders), justification: Arc::new(HttpProviders) }
	}
}

struct HttpProviders;

impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, scholar_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::request_embeddings(cfg, texts))
	}
}

impl JustificationProvider for HttpProviders {
	fn justify<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		context: &'a Value,
	) -> BoxFuture<'a, scholar_providers::Result<String>> {
		Box::pin(justification::justify(cfg, context))
	}
}

impl VectorIndex for QdrantStore {
	fn ensure_collection<'a>(
		&'a self,
		collection: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(QdrantStore::ensure_collection(self, collection))
	}

	fn upsert<'a>(
		&'a self,
		collection: &'a str,
		point: EmbeddingPoint,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(QdrantStore::upsert(self, collection, point))
	}

	fn upsert_batch<'a>(
		&'a self,
		collection: &'a str,
		points: Vec<EmbeddingPoint>,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(QdrantStore::upsert_batch(self, collection, points))
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		limit: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<ScoredMatch>>> {
		Box::pin(QdrantStore::search(self, collection, vector, limit, score_threshold))
	}

	fn find_by_external_id<'a>(
		&'a self,
		collection: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<StoredPoint>>> {
		Box::pin(QdrantStore::find_by_external_id(self, collection, external_id))
	}

	fn delete<'a>(
		&'a self,
		collection: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(QdrantStore::delete(self, collection, external_id))
	}

	fn is_reachable<'a>(&'a self) -> BoxFuture<'a, bool> {
		Box::pin(QdrantStore::is_reachable(self))
	}
}

pub struct PgBatchStore {
	pub pool: PgPool,
}
impl BatchStore for PgBatchStore {
	fn find<'a>(
		&'a self,
		fingerprint: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<RecommendationBatch>>> {
		Box::pin(batches::find_batch(&self.pool, fingerprint))
	}

	fn insert<'a>(
		&'a self,
		batch: &'a RecommendationBatch,
	) -> BoxFuture<'a, scholar_storage::Result<bool>> {
		Box::pin(batches::insert_batch(&self.pool, batch))
	}
}

pub struct MatchService {
	pub cfg: Config,
	pub taxonomy: TaxonomyResolver,
	pub index: Option<Arc<dyn VectorIndex>>,
	pub batches: Arc<dyn BatchStore>,
	pub profiles: Option<Arc<dyn ProfileSource>>,
	pub providers: Providers,
	embedder: Embedder,
	results_cache: TtlCache<MatchOutcome>,
	guard: single_flight::SingleFlight,
}
impl MatchService {
	pub fn new(
		cfg: Config,
		index: Option<Arc<dyn VectorIndex>>,
		batches: Arc<dyn BatchStore>,
		profiles: Option<Arc<dyn ProfileSource>>,
		providers: Providers,
	) -> Self {
		let taxonomy = TaxonomyResolver::from_config(&cfg.taxonomy);
		let embedder = Embedder::new(Duration::days(cfg.cache.embedding_ttl_days));
		let results_cache = TtlCache::new(Duration::minutes(cfg.cache.results_ttl_minutes));

		Self {
			cfg,
			taxonomy,
			index,
			batches,
			profiles,
			providers,
			embedder,
			results_cache,
			guard: single_flight::SingleFlight::new(),
		}
	}

	pub(crate) fn embedder(&self) -> &Embedder {
		&self.embedder
	}

	pub(crate) fn results_cache(&self) -> &TtlCache<MatchOutcome> {
		&self.results_cache
	}

	pub(crate) fn guard(&self) -> &single_flight::SingleFlight {
		&self.guard
	}

	pub fn collection_for(&self, entity: EntityType) -> String {
		entity.collection(&self.cfg.storage.qdrant.collection_prefix)
	}
}
