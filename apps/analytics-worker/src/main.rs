use std::sync::Arc;

use clap::Parser;
use logflux_analytics_worker::jobs::{aggregated_metrics, error_rate, log_volume, top_errors, usage_stats};
use logflux_analytics_worker::{scheduler, JobDeps, Settings};
use logflux_cache::{MetricsCache, RedisSubstrate};
use logflux_db::{AggregatedMetricsRepository, ErrorGroupRepository, LogStoreClient, LogsRepository};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logflux_telemetry::init("logflux_analytics_worker");

    let settings = Settings::parse();
    let redis = RedisSubstrate::connect(&settings.redis_url).await?;
    let db = LogStoreClient::connect(&settings.database_url, settings.turso_auth_token.clone()).await?;

    let deps = Arc::new(JobDeps {
        db: db.clone(),
        logs: Arc::new(LogsRepository::new(db.clone(), 0)),
        error_groups: Arc::new(ErrorGroupRepository::new(db.clone())),
        aggregated_metrics: Arc::new(AggregatedMetricsRepository::new(db.clone())),
        metrics_cache: Arc::new(MetricsCache::new(redis.clone())),
        settings: Arc::new(settings.clone()),
    });

    info!("analytics worker starting, scheduling five pre-aggregation jobs");

    scheduler::spawn("error_rate", settings.error_rate_cadence_secs, deps.clone(), |deps| async move {
        error_rate::run_once(&deps).await
    });
    scheduler::spawn("log_volume", settings.log_volume_cadence_secs, deps.clone(), |deps| async move {
        log_volume::run_once(&deps).await
    });
    scheduler::spawn("top_errors", settings.top_errors_cadence_secs, deps.clone(), |deps| async move {
        top_errors::run_once(&deps).await
    });
    scheduler::spawn("usage_stats", settings.usage_stats_cadence_secs, deps.clone(), |deps| async move {
        usage_stats::run_once(&deps).await
    });
    scheduler::spawn(
        "aggregated_metrics",
        settings.aggregated_metrics_cadence_secs,
        deps.clone(),
        |deps| async move { aggregated_metrics::run_once(&deps).await },
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    Ok(())
}
