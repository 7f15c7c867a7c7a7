use std::sync::Arc;

use clap::Parser;
use logflux_cache::{ProjectQueue, RedisSubstrate};
use logflux_db::{DeadLetterRepository, ErrorGroupRepository, IngestionMetricsRepository, LogStoreClient, LogsRepository};
use logflux_storage_worker::{partition_lifecycle, supervisor, DrainDeps, Settings};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logflux_telemetry::init("logflux_storage_worker");

    let settings = Settings::parse();
    let redis = RedisSubstrate::connect(&settings.redis_url).await?;
    let db = LogStoreClient::connect(&settings.database_url, settings.turso_auth_token.clone()).await?;

    let deps = Arc::new(DrainDeps {
        queue: Arc::new(ProjectQueue::new(redis.clone(), u64::MAX)),
        logs: Arc::new(LogsRepository::new(db.clone(), settings.worker_id)),
        error_groups: Arc::new(ErrorGroupRepository::new(db.clone())),
        ingestion_metrics: Arc::new(IngestionMetricsRepository::new(db.clone())),
        dead_letter: Arc::new(DeadLetterRepository::new(db.clone())),
        settings: Arc::new(settings.clone()),
    });

    info!(
        batch_max_items = settings.batch_max_items,
        flush_interval_ms = settings.flush_interval_ms,
        "storage worker starting"
    );

    let lifecycle_db = db.clone();
    let lifecycle_settings = settings.clone();
    tokio::spawn(async move { partition_lifecycle::run(lifecycle_db, &lifecycle_settings).await });

    supervisor::run(deps).await;
    Ok(())
}
