use chrono::{DateTime, Utc};
use libsql::params;
use logflux_models::partition_name;
use tracing::instrument;

use crate::client::LogStoreClient;
use crate::errors::StoreError;
use crate::schema;

const INGESTION_METRICS_PREFIX: &str = "ingestion_metrics";

/// One flush cycle's throughput/latency sample, emitted by the storage
/// worker after every drain-loop flush.
#[derive(Debug, Clone)]
pub struct IngestionMetricsSample {
    pub recorded_at: DateTime<Utc>,
    pub logs_persisted: u64,
    pub logs_failed: u64,
    pub flush_duration_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub queue_depth_sample: u64,
    pub worker_count: u32,
}

pub struct IngestionMetricsRepository {
    client: LogStoreClient,
}

impl IngestionMetricsRepository {
    pub fn new(client: LogStoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, sample))]
    pub async fn record(&self, sample: &IngestionMetricsSample) -> Result<(), StoreError> {
        let conn = self.client.connection()?;
        let partition = partition_name(INGESTION_METRICS_PREFIX, sample.recorded_at);
        schema::ensure_ingestion_metrics_partition(&conn, &partition).await?;

        let sql = format!(
            "INSERT INTO {partition} (recorded_at, logs_persisted, logs_failed, flush_duration_ms, \
             p95_latency_ms, p99_latency_ms, queue_depth_sample, worker_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        );
        conn.execute(
            &sql,
            params![
                sample.recorded_at.to_rfc3339(),
                sample.logs_persisted as i64,
                sample.logs_failed as i64,
                sample.flush_duration_ms,
                sample.p95_latency_ms,
                sample.p99_latency_ms,
                sample.queue_depth_sample as i64,
                sample.worker_count as i64
            ],
        )
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }
}
