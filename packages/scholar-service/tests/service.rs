use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::Value;

use scholar_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use scholar_domain::{EntityType, Profile, QueryClass, similarity, text};
use scholar_service::{
	BatchStore, BoxFuture, EmbeddingProvider, IndexOutcome, JustificationProvider, MatchRequest,
	MatchService, ProfileSource, Providers, RecommendRequest, Strategy, VectorIndex,
};
use scholar_storage::{
	models::{EmbeddingPoint, RecommendationBatch, ScoredMatch, StoredPoint},
	point_id,
};

const DIM: usize = 64;

struct HashEmbedding {
	calls: AtomicUsize,
}
impl HashEmbedding {
	fn new() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0) })
	}
}
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, scholar_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors = texts
			.iter()
			.map(|text| scholar_testkit::embedding_for(text, cfg.dimensions as usize))
			.collect();

		Box::pin(async move { Ok(vectors) })
	}
}

struct CountingJustification {
	calls: AtomicUsize,
}
impl CountingJustification {
	fn new() -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0) })
	}
}
impl JustificationProvider for CountingJustification {
	fn justify<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_context: &'a Value,
	) -> BoxFuture<'a, scholar_providers::Result<String>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move { Ok("Shared research focus.".to_string()) })
	}
}

#[derive(Default)]
struct InMemoryIndex {
	points: Mutex<HashMap<String, HashMap<String, EmbeddingPoint>>>,
}
impl InMemoryIndex {
	fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	fn contains(&self, collection: &str, external_id: &str) -> bool {
		self.points
			.lock()
			.expect("lock")
			.get(collection)
			.map(|points| points.contains_key(external_id))
			.unwrap_or(false)
	}
}
impl VectorIndex for InMemoryIndex {
	fn ensure_collection<'a>(
		&'a self,
		collection: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		self.points.lock().expect("lock").entry(collection.to_string()).or_default();

		Box::pin(async move { Ok(()) })
	}

	fn upsert<'a>(
		&'a self,
		collection: &'a str,
		point: EmbeddingPoint,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		self.points
			.lock()
			.expect("lock")
			.entry(collection.to_string())
			.or_default()
			.insert(point.external_id.clone(), point);

		Box::pin(async move { Ok(()) })
	}

	fn upsert_batch<'a>(
		&'a self,
		collection: &'a str,
		points: Vec<EmbeddingPoint>,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		let mut guard = self.points.lock().expect("lock");
		let entry = guard.entry(collection.to_string()).or_default();

		for point in points {
			entry.insert(point.external_id.clone(), point);
		}

		drop(guard);

		Box::pin(async move { Ok(()) })
	}

	fn search<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		limit: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<ScoredMatch>>> {
		let guard = self.points.lock().expect("lock");
		let mut hits: Vec<ScoredMatch> = guard
			.get(collection)
			.into_iter()
			.flat_map(|points| points.values())
			.filter_map(|point| {
				let score = similarity::cosine(vector, &point.vector);

				(score >= score_threshold).then(|| ScoredMatch {
					external_id: point.external_id.clone(),
					score,
					payload: point.payload.clone(),
				})
			})
			.collect();

		drop(guard);
		hits.sort_by(|left, right| {
			right
				.score
				.partial_cmp(&left.score)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then_with(|| left.external_id.cmp(&right.external_id))
		});
		hits.truncate(limit as usize);

		Box::pin(async move { Ok(hits) })
	}

	fn find_by_external_id<'a>(
		&'a self,
		collection: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<StoredPoint>>> {
		let found = self
			.points
			.lock()
			.expect("lock")
			.get(collection)
			.and_then(|points| points.get(external_id))
			.map(|point| StoredPoint {
				point_id: point_id::derive(&point.external_id),
				external_id: point.external_id.clone(),
				payload: point.payload.clone(),
			});

		Box::pin(async move { Ok(found) })
	}

	fn delete<'a>(
		&'a self,
		collection: &'a str,
		external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		if let Some(points) = self.points.lock().expect("lock").get_mut(collection) {
			points.remove(external_id);
		}

		Box::pin(async move { Ok(()) })
	}

	fn is_reachable<'a>(&'a self) -> BoxFuture<'a, bool> {
		Box::pin(async move { true })
	}
}

/// Returns scripted hits per query vector, but only once the requested
/// threshold has dropped to `max_threshold` or below. Records every
/// attempted threshold.
struct ScriptedIndex {
	responses: Vec<(Vec<f32>, Vec<ScoredMatch>)>,
	max_threshold: f32,
	attempts: Mutex<Vec<f32>>,
}
impl ScriptedIndex {
	fn new(responses: Vec<(Vec<f32>, Vec<ScoredMatch>)>, max_threshold: f32) -> Arc<Self> {
		Arc::new(Self { responses, max_threshold, attempts: Mutex::new(Vec::new()) })
	}

	fn attempts(&self) -> Vec<f32> {
		self.attempts.lock().expect("lock").clone()
	}
}
impl VectorIndex for ScriptedIndex {
	fn ensure_collection<'a>(
		&'a self,
		_collection: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn upsert<'a>(
		&'a self,
		_collection: &'a str,
		_point: EmbeddingPoint,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn upsert_batch<'a>(
		&'a self,
		_collection: &'a str,
		_points: Vec<EmbeddingPoint>,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn search<'a>(
		&'a self,
		_collection: &'a str,
		vector: &'a [f32],
		_limit: u32,
		score_threshold: f32,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<ScoredMatch>>> {
		self.attempts.lock().expect("lock").push(score_threshold);

		let hits = if score_threshold <= self.max_threshold {
			self.responses
				.iter()
				.find(|(expected, _)| expected.as_slice() == vector)
				.map(|(_, hits)| hits.clone())
				.unwrap_or_default()
		} else {
			Vec::new()
		};

		Box::pin(async move { Ok(hits) })
	}

	fn find_by_external_id<'a>(
		&'a self,
		_collection: &'a str,
		_external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<StoredPoint>>> {
		Box::pin(async move { Ok(None) })
	}

	fn delete<'a>(
		&'a self,
		_collection: &'a str,
		_external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn is_reachable<'a>(&'a self) -> BoxFuture<'a, bool> {
		Box::pin(async move { true })
	}
}

struct FailingIndex;
impl VectorIndex for FailingIndex {
	fn ensure_collection<'a>(
		&'a self,
		_collection: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn upsert<'a>(
		&'a self,
		_collection: &'a str,
		_point: EmbeddingPoint,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move {
			Err(scholar_storage::Error::Qdrant { status: 503, message: "down".to_string() })
		})
	}

	fn upsert_batch<'a>(
		&'a self,
		_collection: &'a str,
		_points: Vec<EmbeddingPoint>,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move {
			Err(scholar_storage::Error::Qdrant { status: 503, message: "down".to_string() })
		})
	}

	fn search<'a>(
		&'a self,
		_collection: &'a str,
		_vector: &'a [f32],
		_limit: u32,
		_score_threshold: f32,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<ScoredMatch>>> {
		Box::pin(async move {
			Err(scholar_storage::Error::Qdrant { status: 503, message: "down".to_string() })
		})
	}

	fn find_by_external_id<'a>(
		&'a self,
		_collection: &'a str,
		_external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<StoredPoint>>> {
		Box::pin(async move { Ok(None) })
	}

	fn delete<'a>(
		&'a self,
		_collection: &'a str,
		_external_id: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn is_reachable<'a>(&'a self) -> BoxFuture<'a, bool> {
		Box::pin(async move { false })
	}
}

#[derive(Default)]
struct InMemoryBatches {
	batches: Mutex<HashMap<String, RecommendationBatch>>,
}
impl InMemoryBatches {
	fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}
}
impl BatchStore for InMemoryBatches {
	fn find<'a>(
		&'a self,
		fingerprint: &'a str,
	) -> BoxFuture<'a, scholar_storage::Result<Option<RecommendationBatch>>> {
		let found = self.batches.lock().expect("lock").get(fingerprint).cloned();

		Box::pin(async move { Ok(found) })
	}

	fn insert<'a>(
		&'a self,
		batch: &'a RecommendationBatch,
	) -> BoxFuture<'a, scholar_storage::Result<bool>> {
		let mut guard = self.batches.lock().expect("lock");
		let inserted = if guard.contains_key(&batch.fingerprint) {
			false
		} else {
			guard.insert(batch.fingerprint.clone(), batch.clone());

			true
		};

		drop(guard);

		Box::pin(async move { Ok(inserted) })
	}
}

struct VecProfiles {
	profiles: Vec<Profile>,
}
impl VecProfiles {
	fn new(profiles: Vec<Profile>) -> Arc<Self> {
		Arc::new(Self { profiles })
	}
}
impl ProfileSource for VecProfiles {
	fn complete_profiles<'a>(
		&'a self,
		entity: EntityType,
	) -> BoxFuture<'a, scholar_storage::Result<Vec<Profile>>> {
		let matching: Vec<Profile> = self
			.profiles
			.iter()
			.filter(|profile| profile.entity_type() == entity)
			.cloned()
			.collect();

		Box::pin(async move { Ok(matching) })
	}
}

fn test_config() -> Config {
	let mut cfg = scholar_testkit::config(DIM as u32);

	cfg.taxonomy.terms.insert("3-12-7".to_string(), "machine learning".to_string());
	cfg.taxonomy.terms.insert("5-2-1".to_string(), "marine biology".to_string());

	cfg
}

struct Harness {
	service: MatchService,
	embedding: Arc<HashEmbedding>,
	justification: Arc<CountingJustification>,
}

fn harness(
	index: Option<Arc<dyn VectorIndex>>,
	profiles: Option<Arc<dyn ProfileSource>>,
) -> Harness {
	let embedding = HashEmbedding::new();
	let justification = CountingJustification::new();
	let providers = Providers {
		embedding: embedding.clone(),
		justification: justification.clone(),
	};
	let service =
		MatchService::new(test_config(), index, InMemoryBatches::new(), profiles, providers);

	Harness { service, embedding, justification }
}

fn ml_academician() -> Profile {
	scholar_testkit::academician("acad-ml", "Dr. Amelia Song", &["3-12-7"])
}

fn marine_academician() -> Profile {
	scholar_testkit::academician("acad-marine", "Dr. Harun Ismail", &["5-2-1"])
}

fn ml_postgraduate() -> Profile {
	scholar_testkit::postgraduate("pg-ml", "Nora Lim", &["3-12-7"])
}

fn document_vector(harness: &Harness, profile: &Profile) -> Vec<f32> {
	let taxonomy = scholar_domain::TaxonomyResolver::from_config(&harness.service.cfg.taxonomy);
	let document = text::build_document(profile, &taxonomy, &harness.service.cfg.text);

	scholar_testkit::embedding_for(&text::normalize_text(&document), DIM)
}

fn query_vector(harness: &Harness, query: &str) -> Vec<f32> {
	let enhanced = scholar_domain::enhance_query(
		&text::normalize_text(query),
		&harness.service.cfg.heuristics,
	);

	scholar_testkit::embedding_for(&enhanced, DIM)
}

fn hit(entity_id: &str, score: f32) -> ScoredMatch {
	ScoredMatch { external_id: entity_id.to_string(), score, payload: serde_json::Map::new() }
}

#[tokio::test]
async fn vague_query_matches_on_profile_embedding_at_low_floor() {
	let index = InMemoryIndex::new();
	let h = harness(Some(index.clone()), None);

	h.service.upsert_profile(&ml_academician()).await.expect("index ml");
	h.service.upsert_profile(&marine_academician()).await.expect("index marine");

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: "find supervisor for me".to_string(),
			requester: Some(ml_postgraduate()),
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(outcome.classification, QueryClass::Vague);
	assert_eq!(outcome.strategy, Strategy::ProfileOnly);
	assert!((outcome.threshold_used - 0.3).abs() < 1e-6);
	assert!(!outcome.results.is_empty());
	assert_eq!(outcome.results[0].entity_id, "acad-ml");
}

#[tokio::test]
async fn indexed_profile_is_its_own_best_match() {
	let index = InMemoryIndex::new();
	let h = harness(Some(index.clone()), None);
	let profile = ml_academician();

	h.service.upsert_profile(&profile).await.expect("index");

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: String::new(),
			requester: Some(profile),
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(outcome.results[0].entity_id, "acad-ml");
	assert!(outcome.results[0].score > 0.99);
}

#[tokio::test]
async fn specific_query_searches_with_query_embedding() {
	let h0 = harness(None, None);
	let vector = query_vector(&h0, "machine learning");
	let scripted = ScriptedIndex::new(vec![(vector, vec![hit("acad-9", 0.8)])], 1.0);
	let h = harness(Some(scripted.clone()), None);

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: "machine learning".to_string(),
			requester: None,
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(outcome.classification, QueryClass::Specific);
	assert_eq!(outcome.strategy, Strategy::QueryOnly);
	assert!((outcome.threshold_used - 0.5).abs() < 1e-6);
	assert_eq!(outcome.results.len(), 1);
	assert_eq!(outcome.results[0].entity_id, "acad-9");
}

#[tokio::test]
async fn specific_query_backs_off_until_results_appear() {
	let h0 = harness(None, None);
	let vector = query_vector(&h0, "underwater basket weaving pedagogy");
	let scripted = ScriptedIndex::new(vec![(vector, vec![hit("acad-1", 0.22)])], 0.25);
	let h = harness(Some(scripted.clone()), None);

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: "underwater basket weaving pedagogy".to_string(),
			requester: None,
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(scripted.attempts(), vec![0.5, 0.35, 0.2]);
	assert!((outcome.threshold_used - 0.2).abs() < 1e-6);
	assert_eq!(outcome.results.len(), 1);
}

#[tokio::test]
async fn vague_query_does_not_back_off() {
	let scripted = ScriptedIndex::new(Vec::new(), 0.0);
	let h = harness(Some(scripted.clone()), None);

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: "for me".to_string(),
			requester: Some(ml_postgraduate()),
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(scripted.attempts(), vec![0.3]);
	assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn blended_strategy_merges_weighted_scores() {
	let h0 = harness(None, None);
	let query = "machine learning curricula design";
	let q_vector = query_vector(&h0, query);
	let p_vector = document_vector(&h0, &ml_postgraduate());
	let scripted = ScriptedIndex::new(
		vec![
			(q_vector, vec![hit("x", 0.8)]),
			(p_vector, vec![hit("x", 0.6), hit("y", 0.9)]),
		],
		1.0,
	);
	let h = harness(Some(scripted.clone()), None);

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: query.to_string(),
			requester: Some(ml_postgraduate()),
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(outcome.strategy, Strategy::Blended);
	assert_eq!(outcome.results.len(), 2);
	assert_eq!(outcome.results[0].entity_id, "x");
	assert!((outcome.results[0].score - 0.72).abs() < 1e-6);
	assert_eq!(outcome.results[1].entity_id, "y");
	assert!((outcome.results[1].score - 0.36).abs() < 1e-6);
}

#[tokio::test]
async fn ineligibility_toggle_removes_stored_vector() {
	let index = InMemoryIndex::new();
	let h = harness(Some(index.clone()), None);
	let collection = h.service.collection_for(EntityType::Academician);

	h.service.upsert_profile(&ml_academician()).await.expect("index");

	assert!(index.contains(&collection, "acad-ml"));

	let mut ineligible = ml_academician();

	if let Profile::Academician(inner) = &mut ineligible {
		inner.expertise_ids.clear();
	}

	let outcome = h.service.upsert_profile(&ineligible).await.expect("gate");

	assert!(matches!(outcome, IndexOutcome::Removed { .. }));
	assert!(!index.contains(&collection, "acad-ml"));

	let again = h.service.upsert_profile(&ineligible).await.expect("gate again");

	assert!(matches!(again, IndexOutcome::Skipped { .. }));
}

#[tokio::test]
async fn missing_index_falls_back_to_brute_force() {
	let profiles = VecProfiles::new(vec![ml_academician(), marine_academician()]);
	let h = harness(None, Some(profiles));

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: "find supervisor for me".to_string(),
			requester: Some(ml_postgraduate()),
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert!(!outcome.results.is_empty());
	assert_eq!(outcome.results[0].entity_id, "acad-ml");
}

#[tokio::test]
async fn index_errors_fall_back_to_brute_force() {
	let profiles = VecProfiles::new(vec![ml_academician(), marine_academician()]);
	let h = harness(Some(Arc::new(FailingIndex)), Some(profiles));

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: "find supervisor for me".to_string(),
			requester: Some(ml_postgraduate()),
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert!(!outcome.results.is_empty());
	assert_eq!(outcome.results[0].entity_id, "acad-ml");
}

#[tokio::test]
async fn no_signal_requests_yield_empty_results() {
	let h = harness(Some(InMemoryIndex::new()), None);

	let outcome = h
		.service
		.find_matches(&MatchRequest {
			query: String::new(),
			requester: None,
			target: EntityType::Academician,
			limit: None,
		})
		.await
		.expect("matches");

	assert_eq!(outcome.strategy, Strategy::NoSignal);
	assert!(outcome.results.is_empty());
	assert_eq!(h.embedding.calls.load(Ordering::SeqCst), 0);
}

fn recommend_request() -> RecommendRequest {
	RecommendRequest {
		requester: ml_postgraduate(),
		query: String::new(),
		target: EntityType::Academician,
		corpus: "intake-2026".to_string(),
		program_type: Some("phd".to_string()),
		limit: None,
	}
}

#[tokio::test]
async fn repeated_recommendations_reuse_the_stored_batch() {
	let index = InMemoryIndex::new();
	let h = harness(Some(index.clone()), None);

	h.service.upsert_profile(&ml_academician()).await.expect("index ml");
	h.service.upsert_profile(&marine_academician()).await.expect("index marine");

	let req = recommend_request();
	let first = h.service.recommend(&req).await.expect("first");

	assert!(!first.reused);
	assert!(!first.batch.rows.is_empty());
	assert!(first.batch.rows[0].justification.is_some());

	let justify_calls = h.justification.calls.load(Ordering::SeqCst);

	assert_eq!(justify_calls, first.batch.rows.len());

	let second = h.service.recommend(&req).await.expect("second");

	assert!(second.reused);
	assert_eq!(second.batch.batch_id, first.batch.batch_id);
	assert_eq!(h.justification.calls.load(Ordering::SeqCst), justify_calls);
}

#[tokio::test]
async fn concurrent_recommendations_compute_once() {
	let index = InMemoryIndex::new();
	let h = harness(Some(index.clone()), None);

	h.service.upsert_profile(&ml_academician()).await.expect("index ml");

	let req = recommend_request();
	let (first, second) = tokio::join!(h.service.recommend(&req), h.service.recommend(&req));
	let first = first.expect("first");
	let second = second.expect("second");

	assert_eq!(first.batch.fingerprint, second.batch.fingerprint);
	assert!(first.reused != second.reused, "exactly one call computes");
	assert_eq!(
		h.justification.calls.load(Ordering::SeqCst),
		first.batch.rows.len(),
		"the expensive pipeline ran once",
	);
}

#[tokio::test]
async fn changed_profile_text_changes_the_fingerprint() {
	let req = recommend_request();
	let text_a = "machine learning";
	let text_b = "machine learning and robotics";

	assert_ne!(
		scholar_service::recommend::fingerprint(&req, text_a),
		scholar_service::recommend::fingerprint(&req, text_b),
	);

	let mut other_corpus = recommend_request();

	other_corpus.corpus = "intake-2027".to_string();

	assert_ne!(
		scholar_service::recommend::fingerprint(&req, text_a),
		scholar_service::recommend::fingerprint(&other_corpus, text_a),
	);
}
