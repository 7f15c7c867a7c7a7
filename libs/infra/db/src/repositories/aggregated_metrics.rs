use libsql::params;
use logflux_models::{AggregatedMetric, MetricType};
use tracing::instrument;

use crate::client::LogStoreClient;
use crate::errors::StoreError;

/// Persistent sink for the hourly `aggregated_metrics` pre-aggregation
/// job. Idempotent by primary key: re-running the same hour overwrites
/// the row rather than duplicating it.
pub struct AggregatedMetricsRepository {
    client: LogStoreClient,
}

impl AggregatedMetricsRepository {
    pub fn new(client: LogStoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, metrics))]
    pub async fn replace_hour(&self, metrics: &[AggregatedMetric]) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let sql = r#"
            INSERT INTO aggregated_metrics (
                project_id, date, hour, metric_type, endpoint_method, endpoint_path,
                log_level, log_type, log_count, error_count,
                avg_duration_ms, min_duration_ms, max_duration_ms, p95_duration_ms, p99_duration_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(project_id, date, hour, metric_type, endpoint_method, endpoint_path, log_level, log_type)
            DO UPDATE SET
                log_count = excluded.log_count,
                error_count = excluded.error_count,
                avg_duration_ms = excluded.avg_duration_ms,
                min_duration_ms = excluded.min_duration_ms,
                max_duration_ms = excluded.max_duration_ms,
                p95_duration_ms = excluded.p95_duration_ms,
                p99_duration_ms = excluded.p99_duration_ms
        "#;

        for metric in metrics {
            conn.execute(
                sql,
                params![
                    metric.project_id.clone(),
                    metric.date,
                    metric.hour,
                    metric.metric_type.as_str().to_string(),
                    metric.endpoint_method.clone(),
                    metric.endpoint_path.clone(),
                    metric.log_level.clone(),
                    metric.log_type.clone(),
                    metric.log_count as i64,
                    metric.error_count as i64,
                    metric.avg_duration_ms,
                    metric.min_duration_ms,
                    metric.max_duration_ms,
                    metric.p95_duration_ms,
                    metric.p99_duration_ms
                ],
            )
            .await
            .map_err(StoreError::Query)?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn query_range(
        &self,
        project_id: &str,
        metric_type: MetricType,
        date_from: u32,
        date_to: u32,
    ) -> Result<Vec<AggregatedMetric>, StoreError> {
        let conn = self.client.connection()?;
        let sql = "SELECT project_id, date, hour, metric_type, endpoint_method, endpoint_path, log_level, \
                    log_type, log_count, error_count, avg_duration_ms, min_duration_ms, max_duration_ms, \
                    p95_duration_ms, p99_duration_ms FROM aggregated_metrics \
                    WHERE project_id = ?1 AND metric_type = ?2 AND date >= ?3 AND date <= ?4 \
                    ORDER BY date, hour";

        let mut rows = conn
            .query(
                sql,
                params![
                    project_id.to_string(),
                    metric_type.as_str().to_string(),
                    date_from,
                    date_to
                ],
            )
            .await
            .map_err(StoreError::Query)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::Query)? {
            results.push(row_to_metric(&row)?);
        }
        Ok(results)
    }
}

fn row_to_metric(row: &libsql::Row) -> Result<AggregatedMetric, StoreError> {
    let map_err = |e: libsql::Error| StoreError::Mapping(e.to_string());
    let metric_type_raw: String = row.get(3).map_err(map_err)?;

    Ok(AggregatedMetric {
        project_id: row.get(0).map_err(map_err)?,
        date: row.get::<i64>(1).map_err(map_err)? as u32,
        hour: row.get::<i64>(2).map_err(map_err)? as u8,
        metric_type: metric_type_from_str(&metric_type_raw)
            .ok_or_else(|| StoreError::Mapping(format!("unrecognized metric_type '{metric_type_raw}'")))?,
        endpoint_method: row.get(4).map_err(map_err)?,
        endpoint_path: row.get(5).map_err(map_err)?,
        log_level: row.get(6).map_err(map_err)?,
        log_type: row.get(7).map_err(map_err)?,
        log_count: row.get::<i64>(8).map_err(map_err)? as u64,
        error_count: row.get::<i64>(9).map_err(map_err)? as u64,
        avg_duration_ms: row.get(10).map_err(map_err)?,
        min_duration_ms: row.get(11).map_err(map_err)?,
        max_duration_ms: row.get(12).map_err(map_err)?,
        p95_duration_ms: row.get(13).map_err(map_err)?,
        p99_duration_ms: row.get(14).map_err(map_err)?,
    })
}

fn metric_type_from_str(raw: &str) -> Option<MetricType> {
    match raw {
        "exception" => Some(MetricType::Exception),
        "endpoint" => Some(MetricType::Endpoint),
        "log_volume" => Some(MetricType::LogVolume),
        _ => None,
    }
}
