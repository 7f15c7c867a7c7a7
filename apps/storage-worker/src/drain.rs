use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use logflux_cache::{CacheError, ProjectQueue};
use logflux_db::{DeadLetterRepository, ErrorGroupRepository, IngestionMetricsRepository, IngestionMetricsSample, LogsRepository};
use logflux_models::{LogEvent, QueueItem};
use tracing::{info, instrument, warn};

use crate::latency::percentile_ms;
use crate::Settings;

/// Everything a drain task needs, bundled so spawning one per project is a
/// single cheap `Arc` clone rather than five.
pub struct DrainDeps {
    pub queue: Arc<ProjectQueue>,
    pub logs: Arc<LogsRepository>,
    pub error_groups: Arc<ErrorGroupRepository>,
    pub ingestion_metrics: Arc<IngestionMetricsRepository>,
    pub dead_letter: Arc<DeadLetterRepository>,
    pub settings: Arc<Settings>,
}

/// Runs forever, draining one project's queue. Spawned by the supervisor
/// the first time a project's queue is observed; never exits on its own —
/// an idle project just means `collect_batch` returns empty vectors.
pub async fn run_project_drain(project_id: String, deps: Arc<DrainDeps>) {
    loop {
        let batch = collect_batch(&deps, &project_id).await;
        if batch.is_empty() {
            continue;
        }
        flush_batch(&deps, &project_id, batch).await;
    }
}

/// Accumulates up to `batch_max_items` queue items, or whatever arrives
/// within `flush_interval_ms`, whichever comes first. Decode/transport
/// failures surfaced by the queue are routed straight to the dead letter
/// sink and do not interrupt accumulation.
async fn collect_batch(deps: &DrainDeps, project_id: &str) -> Vec<QueueItem> {
    let max_items = deps.settings.batch_max_items;
    let max_wait = Duration::from_millis(deps.settings.flush_interval_ms);
    let deadline = Instant::now() + max_wait;

    let mut batch = Vec::with_capacity(max_items.min(64));
    while batch.len() < max_items {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        match deps.queue.dequeue_blocking(project_id, remaining).await {
            Ok(Some(item)) => batch.push(item),
            Ok(None) => break,
            Err(CacheError::Decode(reason)) => {
                warn!(project_id, error = %reason, "queue item failed to decode, routing to dead letter");
                let _ = deps
                    .dead_letter
                    .record(Some(project_id), &format!("decode failure: {reason}"), &[])
                    .await;
            }
            Err(err) => {
                warn!(project_id, error = %err, "transient error draining queue, retrying");
                break;
            }
        }
    }
    batch
}

#[instrument(skip(deps, batch), fields(items = batch.len()))]
async fn flush_batch(deps: &DrainDeps, project_id: &str, batch: Vec<QueueItem>) {
    let flush_start = Instant::now();
    let now = Utc::now();

    let latencies: Vec<f64> = batch
        .iter()
        .map(|item| (now - item.enqueued_at).num_milliseconds().max(0) as f64)
        .collect();

    let events: Vec<LogEvent> = batch.iter().map(|item| item.event.clone()).collect();
    let submitted = events.len() as u64;

    let outcome = match deps.logs.insert_batch(events).await {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(project_id, error = %err, "batch insert failed outright, routing every item to dead letter");
            for item in &batch {
                route_to_dead_letter(deps, project_id, &item.event, &err.to_string()).await;
            }
            record_ingestion_metrics(deps, project_id, flush_start, &latencies, 0, submitted).await;
            return;
        }
    };

    for failed in &outcome.failed_rows {
        route_to_dead_letter(deps, project_id, failed, "failed integrity check after per-row retry").await;
    }

    for item in persisted_survivors(&batch, &outcome.failed_rows) {
        let Some(fingerprint) = &item.event.error_fingerprint else {
            continue;
        };
        let error_type = item.event.error_type.as_deref().unwrap_or("unknown");
        let error_message = item.event.error_message.as_deref().unwrap_or("");
        if let Err(err) = deps
            .error_groups
            .record_occurrence(
                project_id,
                fingerprint,
                error_type,
                error_message,
                item.event.timestamp,
                None,
                item.event.stack_trace.as_deref(),
            )
            .await
        {
            warn!(project_id, error = %err, fingerprint, "error group upsert failed");
        }
    }

    info!(project_id, persisted = outcome.persisted, failed = outcome.failed_rows.len(), "flush complete");
    record_ingestion_metrics(deps, project_id, flush_start, &latencies, outcome.persisted, submitted).await;
}

/// `insert_batch` doesn't echo back the persisted subset, only the rows
/// that failed — so persisted items are identified as "everything not in
/// `failed_rows`", keyed on (timestamp, message) since ids aren't assigned
/// on the caller's copies. A client retrying the exact same event within
/// the same flush is the one case this conflates with a real failure; at
/// at-least-once-delivery granularity that's an acceptable trade.
fn persisted_survivors<'a>(batch: &'a [QueueItem], failed_rows: &[LogEvent]) -> Vec<&'a QueueItem> {
    let failed_keys: HashSet<(i64, &str)> = failed_rows
        .iter()
        .map(|row| (row.timestamp.timestamp_nanos_opt().unwrap_or_default(), row.message.as_str()))
        .collect();

    batch
        .iter()
        .filter(|item| {
            let key = (item.event.timestamp.timestamp_nanos_opt().unwrap_or_default(), item.event.message.as_str());
            !failed_keys.contains(&key)
        })
        .collect()
}

async fn route_to_dead_letter(deps: &DrainDeps, project_id: &str, event: &LogEvent, reason: &str) {
    let payload = serde_json::to_vec(event).unwrap_or_default();
    if let Err(err) = deps.dead_letter.record(Some(project_id), reason, &payload).await {
        warn!(project_id, error = %err, "failed to record dead letter row");
    }
}

async fn record_ingestion_metrics(
    deps: &DrainDeps,
    project_id: &str,
    flush_start: Instant,
    latencies: &[f64],
    persisted: u64,
    submitted: u64,
) {
    let mut latencies = latencies.to_vec();
    let queue_depth_sample = match deps.queue.depth(project_id).await {
        Ok(depth) => depth.depth,
        Err(_) => 0,
    };

    let sample = IngestionMetricsSample {
        recorded_at: Utc::now(),
        logs_persisted: persisted,
        logs_failed: submitted.saturating_sub(persisted),
        flush_duration_ms: flush_start.elapsed().as_secs_f64() * 1000.0,
        p95_latency_ms: percentile_ms(&mut latencies, 95.0),
        p99_latency_ms: percentile_ms(&mut latencies, 99.0),
        queue_depth_sample,
        worker_count: 1,
    };

    if let Err(err) = deps.ingestion_metrics.record(&sample).await {
        warn!(project_id, error = %err, "failed to record ingestion metrics sample");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logflux_models::{Importance, LogLevel, LogType};

    fn event(message: &str, timestamp: chrono::DateTime<Utc>) -> LogEvent {
        LogEvent {
            id: None,
            project_id: "proj_1".to_string(),
            timestamp,
            ingested_at: Some(timestamp),
            level: LogLevel::Error,
            log_type: LogType::Exception,
            importance: Importance::High,
            environment: None,
            release: None,
            message: message.to_string(),
            error_type: Some("ValueError".to_string()),
            error_message: Some("boom".to_string()),
            stack_trace: None,
            attributes: None,
            sdk_version: None,
            platform: None,
            platform_version: None,
            processing_time_ms: None,
            error_fingerprint: Some("fp-1".to_string()),
        }
    }

    fn item(message: &str, timestamp: chrono::DateTime<Utc>) -> QueueItem {
        QueueItem::new(event(message, timestamp), timestamp)
    }

    #[test]
    fn all_items_survive_when_nothing_failed() {
        let t = Utc::now();
        let batch = vec![item("a", t), item("b", t)];
        let survivors = persisted_survivors(&batch, &[]);
        assert_eq!(survivors.len(), 2);
    }

    #[test]
    fn failed_rows_are_excluded_from_survivors() {
        let t = Utc::now();
        let batch = vec![item("a", t), item("b", t)];
        let failed = vec![event("a", t)];
        let survivors = persisted_survivors(&batch, &failed);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].event.message, "b");
    }

    #[test]
    fn distinct_timestamps_with_the_same_message_are_not_conflated() {
        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::seconds(1);
        let batch = vec![item("dup", t1), item("dup", t2)];
        let failed = vec![event("dup", t1)];
        let survivors = persisted_survivors(&batch, &failed);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].enqueued_at, t2);
    }
}
