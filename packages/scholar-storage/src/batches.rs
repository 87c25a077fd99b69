use sqlx::PgPool;
use uuid::Uuid;

use crate::{
	Result,
	models::{RecommendationBatch, RecommendationBatchHead, RecommendationRow},
};

/// Returns the stored batch for a fingerprint, rows ordered by descending
/// score. `None` means the expensive pipeline has never run for these
/// inputs.
pub async fn find_batch(pool: &PgPool, fingerprint: &str) -> Result<Option<RecommendationBatch>> {
	let head: Option<RecommendationBatchHead> = sqlx::query_as(
		"\
SELECT batch_id, fingerprint, requester_id, corpus, created_at
FROM recommendation_batches
WHERE fingerprint = $1",
	)
	.bind(fingerprint)
	.fetch_optional(pool)
	.await?;
	let Some(head) = head else { return Ok(None) };
	let rows: Vec<RecommendationRow> = sqlx::query_as(
		"\
SELECT entity_id, score, justification
FROM recommendation_rows
WHERE batch_id = $1
ORDER BY score DESC, entity_id",
	)
	.bind(head.batch_id)
	.fetch_all(pool)
	.await?;

	Ok(Some(RecommendationBatch {
		batch_id: head.batch_id,
		fingerprint: head.fingerprint,
		requester_id: head.requester_id,
		corpus: head.corpus,
		created_at: head.created_at,
		rows,
	}))
}

/// Inserts a batch once. A concurrent writer that already inserted the same
/// fingerprint wins; this call then leaves the stored batch untouched.
pub async fn insert_batch(pool: &PgPool, batch: &RecommendationBatch) -> Result<bool> {
	let mut tx = pool.begin().await?;
	let inserted = sqlx::query(
		"\
INSERT INTO recommendation_batches (batch_id, fingerprint, requester_id, corpus, created_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (fingerprint) DO NOTHING",
	)
	.bind(batch.batch_id)
	.bind(&batch.fingerprint)
	.bind(&batch.requester_id)
	.bind(&batch.corpus)
	.bind(batch.created_at)
	.execute(&mut *tx)
	.await?
	.rows_affected();

	if inserted == 0 {
		tx.rollback().await?;

		return Ok(false);
	}

	for row in &batch.rows {
		sqlx::query(
			"\
INSERT INTO recommendation_rows (row_id, batch_id, entity_id, score, justification)
VALUES ($1, $2, $3, $4, $5)",
		)
		.bind(Uuid::new_v4())
		.bind(batch.batch_id)
		.bind(&row.entity_id)
		.bind(row.score)
		.bind(&row.justification)
		.execute(&mut *tx)
		.await?;
	}

	tx.commit().await?;

	Ok(true)
}
