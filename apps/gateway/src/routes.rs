use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{ingest, logs, metrics, notifications, queue};
use crate::middleware::{auth_layer, deadline_layer, rate_limit_layer};
use crate::state::AppState;

/// Every endpoint spec.md §6 names, verbatim. All of them sit behind the
/// auth + rate-limit middleware pair (§4.2's pipeline order: credential
/// extraction → C1 resolve → rate limit → circuit-breaker-gated dispatch
/// — the breaker is consulted inside `auth_layer`, folded into C1's
/// `resolve`). The SSE stream is mounted outside `deadline_layer`: it's a
/// long-lived connection by design, not a request that's overrunning.
pub fn build(state: AppState) -> Router {
    let bounded = Router::new()
        .route("/api/v1/ingest/single", post(ingest::ingest_single))
        .route("/api/v1/ingest/batch", post(ingest::ingest_batch))
        .route("/api/v1/queue/depth", get(queue::queue_depth))
        .route("/api/v1/logs", get(logs::query_logs))
        .route("/api/v1/logs/search", get(logs::search_logs))
        .route("/api/v1/logs/:id", get(logs::get_log))
        .route("/api/v1/metrics/error-rate", get(metrics::error_rate))
        .route("/api/v1/metrics/log-volume", get(metrics::log_volume))
        .route("/api/v1/metrics/top-errors", get(metrics::top_errors))
        .route("/api/v1/metrics/usage-stats", get(metrics::usage_stats))
        .route("/api/v1/metrics/aggregated", get(metrics::aggregated_metrics))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), deadline_layer));

    let unbounded = Router::new().route("/api/v1/notifications/stream", get(notifications::stream));

    bounded
        .merge(unbounded)
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_layer))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth_layer))
        .with_state(state)
}
