use chrono::{Datelike, Duration as ChronoDuration, Months, Utc};
use logflux_db::{drop_partition, ensure_ingestion_metrics_partition, ensure_logs_partition, LogStoreClient};
use logflux_models::partition_name;
use tracing::{info, instrument, warn};

use crate::Settings;

const LOGS_PREFIX: &str = "logs";
const INGESTION_METRICS_PREFIX: &str = "ingestion_metrics";

/// Periodic task (default hourly): makes sure the current and next
/// calendar month's partitions exist ahead of need, and drops any logs
/// partition entirely older than `max_retention_days` — the coarsest
/// retention ceiling across all projects. Per-project retention narrower
/// than this ceiling is enforced at query time, not by deleting data here.
pub async fn run(db: LogStoreClient, settings: &Settings) {
    let interval = std::time::Duration::from_secs(settings.partition_lifecycle_interval_secs);
    loop {
        if let Err(err) = tick(&db, settings.max_retention_days).await {
            warn!(error = %err, "partition lifecycle tick failed");
        }
        tokio::time::sleep(interval).await;
    }
}

#[instrument(skip(db))]
pub async fn tick(db: &LogStoreClient, max_retention_days: i64) -> Result<(), logflux_db::StoreError> {
    let conn = db.connection()?;
    let now = Utc::now();
    let next_month = now
        .checked_add_months(Months::new(1))
        .expect("adding one month to the current instant never overflows");

    ensure_logs_partition(&conn, &partition_name(LOGS_PREFIX, now)).await?;
    ensure_logs_partition(&conn, &partition_name(LOGS_PREFIX, next_month)).await?;
    ensure_ingestion_metrics_partition(&conn, &partition_name(INGESTION_METRICS_PREFIX, now)).await?;
    ensure_ingestion_metrics_partition(&conn, &partition_name(INGESTION_METRICS_PREFIX, next_month)).await?;

    let cutoff = now - ChronoDuration::days(max_retention_days);
    let mut rows = conn
        .query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'logs\\_%' ESCAPE '\\'",
            (),
        )
        .await?;

    let mut dropped = 0u32;
    while let Some(row) = rows.next().await? {
        let table_name: String = row.get(0).map_err(|e| logflux_db::StoreError::Mapping(e.to_string()))?;
        if let Some((year, month)) = parse_partition_suffix(&table_name) {
            if year < cutoff.year() || (year == cutoff.year() && month < cutoff.month()) {
                drop_partition(&conn, &table_name).await?;
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        info!(dropped, "retention sweep dropped expired logs partitions");
    }

    Ok(())
}

fn parse_partition_suffix(table_name: &str) -> Option<(i32, u32)> {
    let suffix = table_name.strip_prefix("logs_")?;
    let mut parts = suffix.splitn(2, '_');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    Some((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_partition_name() {
        assert_eq!(parse_partition_suffix("logs_2025_11"), Some((2025, 11)));
    }

    #[test]
    fn ignores_tables_outside_the_logs_prefix() {
        assert_eq!(parse_partition_suffix("ingestion_metrics_2025_11"), None);
        assert_eq!(parse_partition_suffix("error_groups"), None);
    }

    #[test]
    fn rejects_a_malformed_suffix() {
        assert_eq!(parse_partition_suffix("logs_notayear_11"), None);
    }
}
