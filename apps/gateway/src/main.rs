use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use logflux_cache::{
    CircuitBreakerConfig, IdentityCache, IdentityCacheConfig, MetricsCache, NotificationBus, NotificationHub,
    ProjectQueue, RateLimiter, RateLimiterConfig, RedisSubstrate,
};
use logflux_db::{AggregatedMetricsRepository, ErrorGroupRepository, LogStoreClient, LogsRepository};
use logflux_gateway::{routes, AppState, Settings};
use logflux_rpc::HttpAuthCollaborator;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logflux_telemetry::init("logflux_gateway");

    let settings = Settings::parse();
    let state = bootstrap(&settings).await?;

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "gateway listening");

    let app = routes::build(state);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn bootstrap(settings: &Settings) -> anyhow::Result<AppState> {
    let redis = RedisSubstrate::connect(&settings.redis_url).await?;
    let db = LogStoreClient::connect(&settings.database_url, settings.turso_auth_token.clone()).await?;

    let collaborator = Arc::new(HttpAuthCollaborator::new(settings.auth_collaborator_endpoint.clone()));
    let identity_cache = Arc::new(IdentityCache::with_breaker_config(
        redis.clone(),
        collaborator,
        IdentityCacheConfig {
            primary_ttl: Duration::from_secs(settings.identity_cache_primary_ttl_secs),
            emergency_ttl: Duration::from_secs(settings.identity_cache_emergency_ttl_secs),
        },
        CircuitBreakerConfig {
            consecutive_failure_threshold: settings.circuit_breaker_consecutive_failures,
            window_size: settings.circuit_breaker_window_size,
            window_failure_ratio: settings.circuit_breaker_window_failure_ratio,
            cool_off: Duration::from_secs(settings.circuit_breaker_cool_off_secs),
        },
    ));

    let rate_limiter = Arc::new(RateLimiter::new(
        redis.clone(),
        RateLimiterConfig {
            default_per_minute: settings.rate_limit_default_per_minute,
            default_per_hour: settings.rate_limit_default_per_hour,
        },
    ));

    let queue = Arc::new(ProjectQueue::new(redis.clone(), settings.queue_depth_ceiling));
    let notification_bus = Arc::new(NotificationBus::new(redis.clone()));
    let notification_hub = Arc::new(NotificationHub::new());

    // One subscriber per gateway process re-broadcasts every project's
    // notifications into the local hub for SSE delivery; it runs for the
    // life of the process and is allowed to restart on disconnect.
    {
        let bus = notification_bus.clone();
        let hub = notification_hub.clone();
        tokio::spawn(async move {
            loop {
                if let Err(err) = bus.run_local_fanout(&hub).await {
                    tracing::warn!(error = %err, "notification bus fan-out disconnected, retrying");
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
    }

    let logs = Arc::new(LogsRepository::new(db.clone(), settings.worker_id));
    let error_groups = Arc::new(ErrorGroupRepository::new(db.clone()));
    let metrics_cache = Arc::new(MetricsCache::new(redis.clone()));
    let aggregated_metrics = Arc::new(AggregatedMetricsRepository::new(db.clone()));

    Ok(AppState {
        settings: Arc::new(settings.clone()),
        identity_cache,
        rate_limiter,
        queue,
        notification_bus,
        notification_hub,
        logs,
        error_groups,
        metrics_cache,
        aggregated_metrics,
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, draining in-flight requests");
}
