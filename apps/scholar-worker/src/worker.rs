use std::{sync::Arc, time::Duration as StdDuration};

use color_eyre::Result;
use time::Duration;

use scholar_domain::{EntityType, Profile};
use scholar_service::MatchService;
use scholar_storage::{db::Db, models::ProfileOutboxEntry, outbox};

const POLL_INTERVAL_MS: u64 = 500;
const CLAIM_LEASE_SECONDS: i64 = 30;
const BASE_BACKOFF_MS: i64 = 500;
const MAX_BACKOFF_MS: i64 = 30_000;

pub struct WorkerState {
	pub db: Db,
	pub service: Arc<MatchService>,
}

/// Drains the profile outbox: the CRUD layer enqueues embedding-write
/// requests whenever a profile changes, and this loop turns them into
/// vector upserts and deletes.
pub async fn run_worker(state: WorkerState) -> Result<()> {
	loop {
		match process_outbox_once(&state).await {
			Ok(true) => continue,
			Ok(false) =>
				tokio::time::sleep(StdDuration::from_millis(POLL_INTERVAL_MS)).await,
			Err(err) => {
				tracing::error!(error = %err, "Outbox processing failed.");
				tokio::time::sleep(StdDuration::from_millis(POLL_INTERVAL_MS)).await;
			},
		}
	}
}

async fn process_outbox_once(state: &WorkerState) -> Result<bool> {
	let Some(entry) =
		outbox::claim_next(&state.db.pool, Duration::seconds(CLAIM_LEASE_SECONDS)).await?
	else {
		return Ok(false);
	};

	match handle_entry(state, &entry).await {
		Ok(()) => outbox::complete(&state.db.pool, entry.outbox_id).await?,
		// Malformed entries never get better; retrying them would wedge the
		// queue behind garbage.
		Err(err @ scholar_service::Error::InvalidRequest { .. }) => {
			tracing::warn!(
				outbox_id = %entry.outbox_id,
				external_id = %entry.external_id,
				error = %err,
				"Dropping malformed outbox entry.",
			);
			outbox::complete(&state.db.pool, entry.outbox_id).await?;
		},
		Err(err) => {
			let backoff = retry_backoff(entry.attempts);

			tracing::warn!(
				outbox_id = %entry.outbox_id,
				external_id = %entry.external_id,
				attempts = entry.attempts,
				error = %err,
				"Outbox entry failed, scheduling retry.",
			);
			outbox::fail(&state.db.pool, entry.outbox_id, &err.to_string(), backoff).await?;
		},
	}

	Ok(true)
}

async fn handle_entry(
	state: &WorkerState,
	entry: &ProfileOutboxEntry,
) -> scholar_service::Result<()> {
	match entry.op.as_str() {
		outbox::OP_UPSERT => {
			let Some(raw) = entry.profile.as_ref() else {
				return Err(scholar_service::Error::InvalidRequest {
					message: format!("Upsert entry {} has no profile payload.", entry.outbox_id),
				});
			};
			let profile: Profile = serde_json::from_value(raw.clone()).map_err(|err| {
				scholar_service::Error::InvalidRequest {
					message: format!("Unparseable profile payload: {err}"),
				}
			})?;
			let outcome = state.service.upsert_profile(&profile).await?;

			tracing::info!(
				external_id = %entry.external_id,
				outcome = ?outcome,
				"Processed profile upsert.",
			);

			Ok(())
		},
		outbox::OP_DELETE => {
			// The entry only carries the external id; the profile row may be
			// gone already. Deleting the derived point id is idempotent, so
			// sweep every entity collection.
			for entity in EntityType::ALL {
				state.service.remove_profile(entity, &entry.external_id).await?;
			}

			tracing::info!(external_id = %entry.external_id, "Processed profile delete.");

			Ok(())
		},
		other => Err(scholar_service::Error::InvalidRequest {
			message: format!("Unknown outbox op {other}."),
		}),
	}
}

/// Exponential backoff from the attempt counter, capped so a poisoned entry
/// retries at a bounded rate.
fn retry_backoff(attempts: i32) -> Duration {
	let shift = attempts.clamp(0, 16) as u32;
	let millis = BASE_BACKOFF_MS.saturating_mul(1_i64 << shift).min(MAX_BACKOFF_MS);

	Duration::milliseconds(millis)
}
