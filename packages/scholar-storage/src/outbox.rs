use serde_json::Value;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Result, models::ProfileOutboxEntry};

pub const OP_UPSERT: &str = "upsert";
pub const OP_DELETE: &str = "delete";

/// The CRUD layer enqueues an entry whenever a profile's completeness or
/// content changes; the worker drains the queue into the vector index.
pub async fn enqueue(
	pool: &PgPool,
	external_id: &str,
	op: &str,
	profile: Option<&Value>,
) -> Result<Uuid> {
	let outbox_id = Uuid::new_v4();

	sqlx::query(
		"\
INSERT INTO profile_outbox (outbox_id, external_id, op, profile)
VALUES ($1, $2, $3, $4)",
	)
	.bind(outbox_id)
	.bind(external_id)
	.bind(op)
	.bind(profile)
	.execute(pool)
	.await?;

	Ok(outbox_id)
}

/// Claims the oldest due entry with a lease so a crashed worker's claim
/// expires instead of wedging the queue.
pub async fn claim_next(pool: &PgPool, lease: Duration) -> Result<Option<ProfileOutboxEntry>> {
	let now = OffsetDateTime::now_utc();
	let entry: Option<ProfileOutboxEntry> = sqlx::query_as(
		"\
UPDATE profile_outbox
SET claimed_until = $1
WHERE outbox_id = (
	SELECT outbox_id
	FROM profile_outbox
	WHERE processed_at IS NULL
		AND next_attempt_at <= $2
		AND (claimed_until IS NULL OR claimed_until < $2)
	ORDER BY created_at
	LIMIT 1
	FOR UPDATE SKIP LOCKED
)
RETURNING outbox_id, external_id, op, profile, attempts",
	)
	.bind(now + lease)
	.bind(now)
	.fetch_optional(pool)
	.await?;

	Ok(entry)
}

pub async fn complete(pool: &PgPool, outbox_id: Uuid) -> Result<()> {
	sqlx::query(
		"\
UPDATE profile_outbox
SET processed_at = $1, claimed_until = NULL, last_error = NULL
WHERE outbox_id = $2",
	)
	.bind(OffsetDateTime::now_utc())
	.bind(outbox_id)
	.execute(pool)
	.await?;

	Ok(())
}

pub async fn fail(pool: &PgPool, outbox_id: Uuid, error: &str, backoff: Duration) -> Result<()> {
	let now = OffsetDateTime::now_utc();

	sqlx::query(
		"\
UPDATE profile_outbox
SET attempts = attempts + 1,
	last_error = $1,
	claimed_until = NULL,
	next_attempt_at = $2
WHERE outbox_id = $3",
	)
	.bind(error)
	.bind(now + backoff)
	.bind(outbox_id)
	.execute(pool)
	.await?;

	Ok(())
}
