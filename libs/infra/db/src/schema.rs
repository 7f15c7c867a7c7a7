//! Schema bootstrap. Tables that exist exactly once (`error_groups`,
//! `dead_letter_logs`, `aggregated_metrics`) are created eagerly on
//! connect; monthly partition tables (`logs_YYYY_MM`,
//! `ingestion_metrics_YYYY_MM`) are created lazily by
//! [`ensure_logs_partition`] / [`ensure_ingestion_metrics_partition`]
//! since libSQL has no declarative partitioning to lean on.

use libsql::Connection;
use tracing::{debug, instrument};

use crate::errors::StoreError;

/// `log_locations` is a small secondary index: `id -> (partition_name,
/// timestamp)`. Without it, looking up a single log by id would require
/// scanning every partition, since the partition a row lives in is keyed
/// on the client-supplied `timestamp`, not on `id`.
const BASE_TABLES: &[(&str, &str)] = &[
    (
        "error_groups",
        r#"
        CREATE TABLE IF NOT EXISTS error_groups (
            project_id TEXT NOT NULL,
            fingerprint TEXT NOT NULL,
            error_type TEXT NOT NULL,
            error_message TEXT NOT NULL,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            occurrence_count INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'unresolved',
            sample_log_id INTEGER,
            sample_stack_trace TEXT,
            PRIMARY KEY (project_id, fingerprint)
        );
    "#,
    ),
    (
        "error_groups_status_idx",
        "CREATE INDEX IF NOT EXISTS error_groups_status_idx ON error_groups (project_id, status);",
    ),
    (
        "dead_letter_logs",
        r#"
        CREATE TABLE IF NOT EXISTS dead_letter_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id TEXT,
            reason TEXT NOT NULL,
            raw_payload BLOB NOT NULL,
            failed_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "log_locations",
        r#"
        CREATE TABLE IF NOT EXISTS log_locations (
            id INTEGER PRIMARY KEY,
            project_id TEXT NOT NULL,
            partition_name TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );
    "#,
    ),
    (
        "aggregated_metrics",
        r#"
        CREATE TABLE IF NOT EXISTS aggregated_metrics (
            project_id TEXT NOT NULL,
            date INTEGER NOT NULL,
            hour INTEGER NOT NULL,
            metric_type TEXT NOT NULL,
            endpoint_method TEXT,
            endpoint_path TEXT,
            log_level TEXT,
            log_type TEXT,
            log_count INTEGER NOT NULL DEFAULT 0,
            error_count INTEGER NOT NULL DEFAULT 0,
            avg_duration_ms REAL NOT NULL DEFAULT 0,
            min_duration_ms REAL NOT NULL DEFAULT 0,
            max_duration_ms REAL NOT NULL DEFAULT 0,
            p95_duration_ms REAL NOT NULL DEFAULT 0,
            p99_duration_ms REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (project_id, date, hour, metric_type, endpoint_method, endpoint_path, log_level, log_type)
        );
    "#,
    ),
];

#[instrument(skip(conn))]
pub async fn apply_base_schema(conn: &Connection) -> Result<(), StoreError> {
    for (name, ddl) in BASE_TABLES {
        conn.execute(ddl, ()).await.map_err(StoreError::Query)?;
        debug!(table = *name, "base table verified");
    }
    Ok(())
}

/// `CREATE TABLE IF NOT EXISTS` for the logs partition named `logs_YYYY_MM`.
/// Idempotent by construction; callers should still cache the last
/// verified partition name to avoid issuing DDL on every flush.
#[instrument(skip(conn))]
pub async fn ensure_logs_partition(conn: &Connection, partition_name: &str) -> Result<(), StoreError> {
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {partition_name} (
            id INTEGER NOT NULL,
            project_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            ingested_at TEXT NOT NULL,
            level TEXT NOT NULL,
            log_type TEXT NOT NULL,
            importance TEXT NOT NULL,
            environment TEXT,
            release TEXT,
            message TEXT NOT NULL,
            error_type TEXT,
            error_message TEXT,
            stack_trace TEXT,
            attributes TEXT,
            sdk_version TEXT,
            platform TEXT,
            platform_version TEXT,
            processing_time_ms INTEGER,
            error_fingerprint TEXT,
            PRIMARY KEY (id, timestamp)
        );
        "#
    );
    conn.execute(&ddl, ()).await.map_err(StoreError::Query)?;

    let idx = format!(
        "CREATE INDEX IF NOT EXISTS {partition_name}_project_time_idx ON {partition_name} (project_id, timestamp);"
    );
    conn.execute(&idx, ()).await.map_err(StoreError::Query)?;

    let fp_idx = format!(
        "CREATE INDEX IF NOT EXISTS {partition_name}_fingerprint_idx ON {partition_name} (project_id, error_fingerprint);"
    );
    conn.execute(&fp_idx, ()).await.map_err(StoreError::Query)?;

    debug!(partition = partition_name, "logs partition verified");
    Ok(())
}

/// Mirrors [`ensure_logs_partition`] for `ingestion_metrics_YYYY_MM`.
#[instrument(skip(conn))]
pub async fn ensure_ingestion_metrics_partition(conn: &Connection, partition_name: &str) -> Result<(), StoreError> {
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {partition_name} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recorded_at TEXT NOT NULL,
            logs_persisted INTEGER NOT NULL,
            logs_failed INTEGER NOT NULL,
            flush_duration_ms REAL NOT NULL,
            p95_latency_ms REAL NOT NULL,
            p99_latency_ms REAL NOT NULL,
            queue_depth_sample INTEGER NOT NULL,
            worker_count INTEGER NOT NULL
        );
        "#
    );
    conn.execute(&ddl, ()).await.map_err(StoreError::Query)?;
    debug!(partition = partition_name, "ingestion metrics partition verified");
    Ok(())
}

/// Drops a monthly logs partition outright. Used by the partition
/// lifecycle task once a partition is older than the coarsest retention
/// window across all projects.
#[instrument(skip(conn))]
pub async fn drop_partition(conn: &Connection, partition_name: &str) -> Result<(), StoreError> {
    let ddl = format!("DROP TABLE IF EXISTS {partition_name};");
    conn.execute(&ddl, ()).await.map_err(StoreError::Query)?;
    debug!(partition = partition_name, "partition dropped");
    Ok(())
}
