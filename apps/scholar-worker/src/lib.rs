use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scholar_service::{MatchService, PgBatchStore, Providers};
use scholar_storage::{db::Db, qdrant::QdrantStore};

pub mod worker;

#[derive(Debug, Parser)]
#[command(rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = scholar_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let qdrant = QdrantStore::new(&config.storage.qdrant)?;

	if !qdrant.is_reachable().await {
		tracing::warn!("Vector store is unreachable at startup, entries will retry with backoff.");
	}

	let batches = Arc::new(PgBatchStore { pool: db.pool.clone() });
	let service =
		MatchService::new(config, Some(Arc::new(qdrant)), batches, None, Providers::http());
	let state = worker::WorkerState { db, service: Arc::new(service) };

	worker::run_worker(state).await
}
