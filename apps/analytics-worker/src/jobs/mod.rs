pub mod aggregated_metrics;
pub mod error_rate;
pub mod log_volume;
pub mod top_errors;
pub mod usage_stats;

use std::sync::Arc;

use logflux_cache::MetricsCache;
use logflux_db::{AggregatedMetricsRepository, ErrorGroupRepository, LogStoreClient, LogsRepository};

use crate::Settings;

/// Shared handles every scheduled job reads from. Jobs never mutate logs
/// or error groups — C5 is read-only on those tables by design.
pub struct JobDeps {
    pub db: LogStoreClient,
    pub logs: Arc<LogsRepository>,
    pub error_groups: Arc<ErrorGroupRepository>,
    pub aggregated_metrics: Arc<AggregatedMetricsRepository>,
    pub metrics_cache: Arc<MetricsCache>,
    pub settings: Arc<Settings>,
}
