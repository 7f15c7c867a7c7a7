use std::collections::HashMap;

use chrono::{Datelike, Duration, Timelike, Utc};
use logflux_models::{AggregatedMetric, LogEvent, LogLevel, LogType, MetricType};
use tracing::{info, instrument, warn};

use crate::jobs::JobDeps;
use crate::project_directory;
use crate::scan::scan_window;
use crate::stats::percentile_ms;

/// Key identifying one output row's dimensions, distinct from the
/// `metric_type` itself which selects which bucket a row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DimensionKey {
    endpoint_method: Option<String>,
    endpoint_path: Option<String>,
    log_level: Option<String>,
    log_type: Option<String>,
}

#[derive(Debug, Default)]
struct Accumulator {
    log_count: u64,
    error_count: u64,
    durations: Vec<f64>,
}

/// Hourly rollup of the last fully completed hour into `aggregated_metrics`,
/// grouped per spec.md §3's schema. Three metric_type buckets share one
/// scan of the hour's events:
///
/// - `log_volume`: every event, dimensioned by `(log_level, log_type)`.
/// - `exception`: events carrying `error_type`, dimensioned by `log_level`.
/// - `endpoint`: events with `log_type == endpoint`, dimensioned by
///   `(method, path)` read out of the `attributes` blob's `"method"`/
///   `"path"` keys — the only place those fields exist on a `LogEvent`,
///   since endpoint metadata isn't a first-class column (see DESIGN.md).
#[instrument(skip(deps))]
pub async fn run_once(deps: &JobDeps) {
    let settings = &deps.settings;
    let reference = Utc::now() - Duration::seconds(settings.lag_secs);
    let hour_end = reference
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .expect("zeroing minute/second/nanosecond of a valid instant stays valid");
    let hour_start = hour_end - Duration::hours(1);

    if hour_end > reference {
        // Not past the hour boundary yet relative to the lag; nothing new
        // to roll up this tick.
        return;
    }

    let date = hour_start.date_naive();
    let date_key = (date.year() as u32) * 10_000 + date.month() * 100 + date.day();
    let hour_key = hour_start.hour() as u8;

    let project_ids = match project_directory::list(&deps.db).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "aggregated_metrics job failed to list projects");
            return;
        }
    };

    for project_id in project_ids {
        let events = match scan_window(&deps.logs, &project_id, hour_start, hour_end, settings.scan_page_size).await {
            Ok(events) => events,
            Err(err) => {
                warn!(project_id, error = %err, "aggregated_metrics scan failed");
                continue;
            }
        };

        let metrics = build_rows(&project_id, date_key, hour_key, &events);
        if metrics.is_empty() {
            continue;
        }
        if let Err(err) = deps.aggregated_metrics.replace_hour(&metrics).await {
            warn!(project_id, error = %err, "aggregated_metrics write failed");
        }
    }

    info!(date = date_key, hour = hour_key, "aggregated_metrics job tick complete");
}

fn build_rows(project_id: &str, date: u32, hour: u8, events: &[LogEvent]) -> Vec<AggregatedMetric> {
    let mut log_volume: HashMap<DimensionKey, Accumulator> = HashMap::new();
    let mut exception: HashMap<DimensionKey, Accumulator> = HashMap::new();
    let mut endpoint: HashMap<DimensionKey, Accumulator> = HashMap::new();

    for event in events {
        let is_error = matches!(event.level, LogLevel::Error | LogLevel::Critical);
        let duration = event.processing_time_ms.map(|ms| ms as f64);

        let volume_key = DimensionKey {
            endpoint_method: None,
            endpoint_path: None,
            log_level: Some(event.level.as_str().to_string()),
            log_type: Some(event.log_type.as_str().to_string()),
        };
        accumulate(&mut log_volume, volume_key, is_error, duration);

        if event.error_type.is_some() {
            let key = DimensionKey {
                endpoint_method: None,
                endpoint_path: None,
                log_level: Some(event.level.as_str().to_string()),
                log_type: None,
            };
            accumulate(&mut exception, key, is_error, duration);
        }

        if event.log_type == LogType::Endpoint {
            let (method, path) = endpoint_dimensions(event);
            let key = DimensionKey {
                endpoint_method: method,
                endpoint_path: path,
                log_level: None,
                log_type: None,
            };
            accumulate(&mut endpoint, key, is_error, duration);
        }
    }

    let mut rows = Vec::new();
    rows.extend(finalize(project_id, date, hour, MetricType::LogVolume, log_volume));
    rows.extend(finalize(project_id, date, hour, MetricType::Exception, exception));
    rows.extend(finalize(project_id, date, hour, MetricType::Endpoint, endpoint));
    rows
}

fn accumulate(map: &mut HashMap<DimensionKey, Accumulator>, key: DimensionKey, is_error: bool, duration: Option<f64>) {
    let entry = map.entry(key).or_default();
    entry.log_count += 1;
    if is_error {
        entry.error_count += 1;
    }
    if let Some(ms) = duration {
        entry.durations.push(ms);
    }
}

fn endpoint_dimensions(event: &LogEvent) -> (Option<String>, Option<String>) {
    let Some(attributes) = &event.attributes else {
        return (None, None);
    };
    let method = attributes.get("method").and_then(|v| v.as_str()).map(str::to_string);
    let path = attributes.get("path").and_then(|v| v.as_str()).map(str::to_string);
    (method, path)
}

fn finalize(
    project_id: &str,
    date: u32,
    hour: u8,
    metric_type: MetricType,
    groups: HashMap<DimensionKey, Accumulator>,
) -> Vec<AggregatedMetric> {
    groups
        .into_iter()
        .map(|(key, mut acc)| {
            let (avg, min, max, p95, p99) = duration_stats(&mut acc.durations);
            AggregatedMetric {
                project_id: project_id.to_string(),
                date,
                hour,
                metric_type,
                endpoint_method: key.endpoint_method,
                endpoint_path: key.endpoint_path,
                log_level: key.log_level,
                log_type: key.log_type,
                log_count: acc.log_count,
                error_count: acc.error_count,
                avg_duration_ms: avg,
                min_duration_ms: min,
                max_duration_ms: max,
                p95_duration_ms: p95,
                p99_duration_ms: p99,
            }
        })
        .collect()
}

fn duration_stats(samples: &mut Vec<f64>) -> (f64, f64, f64, f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0, 0.0, 0.0, 0.0);
    }
    let sum: f64 = samples.iter().sum();
    let avg = sum / samples.len() as f64;
    let p95 = percentile_ms(samples, 95.0);
    let p99 = percentile_ms(samples, 99.0);
    let min = samples.first().copied().unwrap_or(0.0);
    let max = samples.last().copied().unwrap_or(0.0);
    (avg, min, max, p95, p99)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use logflux_models::Importance;

    fn event(level: LogLevel, log_type: LogType, error_type: Option<&str>, duration: Option<i64>) -> LogEvent {
        LogEvent {
            id: None,
            project_id: "proj_1".to_string(),
            timestamp: Utc::now(),
            ingested_at: Some(Utc::now()),
            level,
            log_type,
            importance: Importance::Standard,
            environment: None,
            release: None,
            message: "m".to_string(),
            error_type: error_type.map(str::to_string),
            error_message: None,
            stack_trace: None,
            attributes: None,
            sdk_version: None,
            platform: None,
            platform_version: None,
            processing_time_ms: duration,
            error_fingerprint: None,
        }
    }

    #[test]
    fn log_volume_bucket_always_gets_a_row_per_distinct_level_and_type() {
        let events = vec![
            event(LogLevel::Info, LogType::Console, None, Some(10)),
            event(LogLevel::Error, LogType::Exception, Some("ValueError"), Some(20)),
        ];
        let rows = build_rows("proj_1", 20251114, 10, &events);
        let volume_rows: Vec<_> = rows.iter().filter(|r| r.metric_type == MetricType::LogVolume).collect();
        assert_eq!(volume_rows.len(), 2);

        let exception_rows: Vec<_> = rows.iter().filter(|r| r.metric_type == MetricType::Exception).collect();
        assert_eq!(exception_rows.len(), 1);
        assert_eq!(exception_rows[0].log_count, 1);
        assert_eq!(exception_rows[0].error_count, 1);
    }

    #[test]
    fn non_exception_events_never_populate_the_exception_bucket() {
        let events = vec![event(LogLevel::Info, LogType::Console, None, None)];
        let rows = build_rows("proj_1", 20251114, 10, &events);
        assert!(rows.iter().all(|r| r.metric_type != MetricType::Exception));
    }
}
