use std::sync::Arc;

use logflux_cache::{IdentityCache, MetricsCache, NotificationBus, NotificationHub, ProjectQueue, RateLimiter};
use logflux_db::{AggregatedMetricsRepository, ErrorGroupRepository, LogsRepository};

use crate::config::Settings;

/// Composition root: every dependency a handler needs, constructed once
/// in `main` and cloned (cheaply, via `Arc`) into the axum router. No
/// ambient globals — everything a handler touches arrives through this
/// struct or an axum extractor.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub identity_cache: Arc<IdentityCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub queue: Arc<ProjectQueue>,
    pub notification_bus: Arc<NotificationBus>,
    pub notification_hub: Arc<NotificationHub>,
    pub logs: Arc<LogsRepository>,
    pub error_groups: Arc<ErrorGroupRepository>,
    pub metrics_cache: Arc<MetricsCache>,
    pub aggregated_metrics: Arc<AggregatedMetricsRepository>,
}

/// Resolved identity for the current request, inserted into request
/// extensions by the auth middleware and read by every downstream
/// handler and the rate-limit middleware. `stale` is `true` when this
/// came from C1's emergency cache rather than a fresh lookup.
#[derive(Debug, Clone)]
pub struct CredentialContext {
    pub credential_hash: String,
    pub project_id: String,
    pub account_id: Option<String>,
    pub daily_quota: u64,
    pub retention_days: u32,
    pub rate_limit_per_minute: Option<u32>,
    pub rate_limit_per_hour: Option<u32>,
    pub stale: bool,
}
