use chrono::{DateTime, Utc};
use libsql::params;
use logflux_models::{ErrorGroup, ErrorGroupStatus};
use tracing::instrument;

use crate::client::LogStoreClient;
use crate::errors::StoreError;

/// Upserts into `error_groups`. First observation inserts with
/// `occurrence_count = 1`; subsequent observations extend `first_seen`
/// backward and `last_seen` forward, never shrink the range, and never
/// touch the sample fields (write-once).
pub struct ErrorGroupRepository {
    client: LogStoreClient,
}

impl ErrorGroupRepository {
    pub fn new(client: LogStoreClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn record_occurrence(
        &self,
        project_id: &str,
        fingerprint: &str,
        error_type: &str,
        error_message: &str,
        observed_at: DateTime<Utc>,
        sample_log_id: Option<i64>,
        sample_stack_trace: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.client.connection()?;

        let sql = r#"
            INSERT INTO error_groups (
                project_id, fingerprint, error_type, error_message,
                first_seen, last_seen, occurrence_count, status,
                sample_log_id, sample_stack_trace
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, 1, 'unresolved', ?6, ?7)
            ON CONFLICT(project_id, fingerprint) DO UPDATE SET
                occurrence_count = occurrence_count + 1,
                first_seen = MIN(first_seen, excluded.first_seen),
                last_seen = MAX(last_seen, excluded.last_seen)
        "#;

        conn.execute(
            sql,
            params![
                project_id.to_string(),
                fingerprint.to_string(),
                error_type.to_string(),
                error_message.to_string(),
                observed_at.to_rfc3339(),
                sample_log_id,
                sample_stack_trace.map(str::to_string)
            ],
        )
        .await
        .map_err(StoreError::Query)?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn top_errors(
        &self,
        project_id: &str,
        limit: u32,
        status: Option<ErrorGroupStatus>,
    ) -> Result<Vec<ErrorGroup>, StoreError> {
        let conn = self.client.connection()?;

        let (sql, bind): (&str, Vec<libsql::Value>) = if let Some(status) = status {
            (
                "SELECT project_id, fingerprint, error_type, error_message, first_seen, last_seen, \
                 occurrence_count, status, sample_log_id, sample_stack_trace FROM error_groups \
                 WHERE project_id = ?1 AND status = ?2 ORDER BY occurrence_count DESC LIMIT ?3",
                params![project_id.to_string(), status_str(status).to_string(), limit as i64],
            )
        } else {
            (
                "SELECT project_id, fingerprint, error_type, error_message, first_seen, last_seen, \
                 occurrence_count, status, sample_log_id, sample_stack_trace FROM error_groups \
                 WHERE project_id = ?1 ORDER BY occurrence_count DESC LIMIT ?2",
                params![project_id.to_string(), limit as i64],
            )
        };

        let mut rows = conn.query(sql, bind).await.map_err(StoreError::Query)?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next().await.map_err(StoreError::Query)? {
            groups.push(row_to_group(&row)?);
        }
        Ok(groups)
    }
}

fn status_str(status: ErrorGroupStatus) -> &'static str {
    match status {
        ErrorGroupStatus::Unresolved => "unresolved",
        ErrorGroupStatus::Resolved => "resolved",
        ErrorGroupStatus::Ignored => "ignored",
        ErrorGroupStatus::Muted => "muted",
    }
}

fn status_from_str(raw: &str) -> ErrorGroupStatus {
    match raw {
        "resolved" => ErrorGroupStatus::Resolved,
        "ignored" => ErrorGroupStatus::Ignored,
        "muted" => ErrorGroupStatus::Muted,
        _ => ErrorGroupStatus::Unresolved,
    }
}

fn row_to_group(row: &libsql::Row) -> Result<ErrorGroup, StoreError> {
    let map_err = |e: libsql::Error| StoreError::Mapping(e.to_string());

    let first_seen_raw: String = row.get(4).map_err(map_err)?;
    let last_seen_raw: String = row.get(5).map_err(map_err)?;
    let status_raw: String = row.get(7).map_err(map_err)?;

    Ok(ErrorGroup {
        project_id: row.get(0).map_err(map_err)?,
        fingerprint: row.get(1).map_err(map_err)?,
        error_type: row.get(2).map_err(map_err)?,
        error_message: row.get(3).map_err(map_err)?,
        first_seen: DateTime::parse_from_rfc3339(&first_seen_raw)
            .map_err(|e| StoreError::Mapping(e.to_string()))?
            .with_timezone(&Utc),
        last_seen: DateTime::parse_from_rfc3339(&last_seen_raw)
            .map_err(|e| StoreError::Mapping(e.to_string()))?
            .with_timezone(&Utc),
        occurrence_count: row.get::<i64>(6).map_err(map_err)? as u64,
        status: status_from_str(&status_raw),
        sample_log_id: row.get(8).map_err(map_err)?,
        sample_stack_trace: row.get(9).map_err(map_err)?,
    })
}
