use chrono::{DateTime, Utc};
use libsql::params;
use logflux_models::{partition_name, partitions_overlapping, Importance, LogEvent, LogLevel, LogType};
use tracing::{info, instrument, warn};

use crate::client::LogStoreClient;
use crate::errors::StoreError;
use crate::id_gen::LogIdGenerator;
use crate::schema;

const LOGS_PREFIX: &str = "logs";
pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub level: Option<String>,
    pub log_type: Option<String>,
    pub environment: Option<String>,
    pub error_fingerprint: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct LogQueryPage {
    pub logs: Vec<LogEvent>,
    pub total: u64,
    pub has_more: bool,
}

/// C4's write path and C5's raw-log read path onto the partitioned `logs`
/// tables. Insert routes each event to its monthly partition and records
/// it in `log_locations`; query/search prune to only the partitions a
/// time range overlaps.
pub struct LogsRepository {
    client: LogStoreClient,
    id_generator: LogIdGenerator,
}

impl LogsRepository {
    pub fn new(client: LogStoreClient, worker_id: u16) -> Self {
        Self {
            client,
            id_generator: LogIdGenerator::new(worker_id),
        }
    }

    /// Streaming bulk insert: one transaction, one prepared statement
    /// reused across every row, rather than a round trip per `INSERT`.
    /// Rows that fail the partition's constraints are retried
    /// individually outside the batch; rows that still fail are hard
    /// failures the caller should route to the dead-letter sink.
    #[instrument(skip(self, events))]
    pub async fn insert_batch(&self, events: Vec<LogEvent>) -> Result<BatchOutcome, StoreError> {
        if events.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let mut by_partition: std::collections::BTreeMap<String, Vec<LogEvent>> = std::collections::BTreeMap::new();
        for event in events {
            let partition = partition_name(LOGS_PREFIX, event.timestamp);
            by_partition.entry(partition).or_default().push(event);
        }

        let conn = self.client.connection()?;
        let mut outcome = BatchOutcome::default();

        for (partition, mut rows) in by_partition {
            schema::ensure_logs_partition(&conn, &partition).await?;

            for row in &mut rows {
                if row.id.is_none() {
                    row.id = Some(self.id_generator.next_id());
                }
            }

            match self.insert_partition_batch(&conn, &partition, &rows).await {
                Ok(persisted) => outcome.persisted += persisted,
                Err(_) => {
                    // Fall back to per-row insert so one bad row doesn't
                    // sink the whole partition's batch.
                    for row in &rows {
                        match self.insert_single(&conn, &partition, row).await {
                            Ok(()) => outcome.persisted += 1,
                            Err(err) => {
                                warn!(error = %err, id = ?row.id, "row failed integrity check, routing to dead letter");
                                outcome.failed_rows.push(row.clone());
                            }
                        }
                    }
                }
            }
        }

        info!(persisted = outcome.persisted, failed = outcome.failed_rows.len(), "batch flush complete");
        Ok(outcome)
    }

    async fn insert_partition_batch(
        &self,
        conn: &libsql::Connection,
        partition: &str,
        rows: &[LogEvent],
    ) -> Result<u64, StoreError> {
        let transaction = conn.transaction().await.map_err(StoreError::Query)?;
        let sql = insert_sql(partition);

        for row in rows {
            transaction.execute(&sql, row_params(row)?).await.map_err(StoreError::Query)?;
            let location_sql =
                "INSERT OR REPLACE INTO log_locations (id, project_id, partition_name, timestamp) VALUES (?1, ?2, ?3, ?4)";
            transaction
                .execute(
                    location_sql,
                    params![
                        row.id.expect("id assigned before insert"),
                        row.project_id.clone(),
                        partition.to_string(),
                        row.timestamp.to_rfc3339()
                    ],
                )
                .await
                .map_err(StoreError::Query)?;
        }

        transaction.commit().await.map_err(StoreError::Query)?;
        Ok(rows.len() as u64)
    }

    async fn insert_single(&self, conn: &libsql::Connection, partition: &str, row: &LogEvent) -> Result<(), StoreError> {
        let sql = insert_sql(partition);
        conn.execute(&sql, row_params(row)?).await.map_err(StoreError::Query)?;
        let location_sql =
            "INSERT OR REPLACE INTO log_locations (id, project_id, partition_name, timestamp) VALUES (?1, ?2, ?3, ?4)";
        conn.execute(
            location_sql,
            params![
                row.id.expect("id assigned before insert"),
                row.project_id.clone(),
                partition.to_string(),
                row.timestamp.to_rfc3339()
            ],
        )
        .await
        .map_err(StoreError::Query)?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_log(&self, project_id: &str, log_id: i64) -> Result<Option<LogEvent>, StoreError> {
        let conn = self.client.connection()?;

        let mut location_rows = conn
            .query(
                "SELECT partition_name FROM log_locations WHERE id = ?1 AND project_id = ?2",
                params![log_id, project_id.to_string()],
            )
            .await
            .map_err(StoreError::Query)?;

        let Some(location_row) = location_rows.next().await.map_err(StoreError::Query)? else {
            return Ok(None);
        };
        let partition: String = location_row.get(0).map_err(|e| StoreError::Mapping(e.to_string()))?;

        let sql = format!("SELECT {COLUMNS} FROM {partition} WHERE id = ?1 AND project_id = ?2");
        let mut rows = conn
            .query(&sql, params![log_id, project_id.to_string()])
            .await
            .map_err(StoreError::Query)?;

        match rows.next().await.map_err(StoreError::Query)? {
            Some(row) => Ok(Some(row_to_event(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn query_logs(&self, project_id: &str, query: &LogQuery) -> Result<LogQueryPage, StoreError> {
        let partitions = partitions_overlapping(LOGS_PREFIX, query.start_time, query.end_time);
        let limit = query.limit.clamp(1, MAX_LIMIT);

        let mut logs = Vec::new();
        let mut total: u64 = 0;

        for partition in &partitions {
            let conn = self.client.connection()?;
            if !table_exists(&conn, partition).await? {
                continue;
            }

            let (where_clause, mut bind) = where_clause_for(project_id, query);
            let count_sql = format!("SELECT COUNT(*) FROM {partition} WHERE {where_clause}");
            let mut count_rows = conn.query(&count_sql, bind.clone()).await.map_err(StoreError::Query)?;
            if let Some(row) = count_rows.next().await.map_err(StoreError::Query)? {
                let partition_total: i64 = row.get(0).map_err(|e| StoreError::Mapping(e.to_string()))?;
                total += partition_total as u64;
            }

            // Pull enough rows from *this* partition alone to cover the
            // global offset+limit window, since a row's rank in the merged,
            // globally-ordered result can't be known per partition. OFFSET
            // stays 0 here; the global offset is applied after the merge
            // below, not per partition.
            let per_partition_fetch = query.offset as i64 + limit as i64;
            bind.push(libsql::Value::Integer(per_partition_fetch));
            bind.push(libsql::Value::Integer(0));
            let select_sql = format!(
                "SELECT {COLUMNS} FROM {partition} WHERE {where_clause} ORDER BY timestamp DESC LIMIT ?{n1} OFFSET ?{n2}",
                n1 = bind.len() - 1,
                n2 = bind.len()
            );
            let mut rows = conn.query(&select_sql, bind).await.map_err(StoreError::Query)?;
            while let Some(row) = rows.next().await.map_err(StoreError::Query)? {
                logs.push(row_to_event(&row)?);
            }
        }

        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let skip = (query.offset as usize).min(logs.len());
        logs.drain(0..skip);
        logs.truncate(limit as usize);
        let has_more = (query.offset as u64 + logs.len() as u64) < total;

        Ok(LogQueryPage { logs, total, has_more })
    }

    #[instrument(skip(self, query_text))]
    pub async fn search_logs(
        &self,
        project_id: &str,
        query_text: &str,
        query: &LogQuery,
    ) -> Result<LogQueryPage, StoreError> {
        let partitions = partitions_overlapping(LOGS_PREFIX, query.start_time, query.end_time);
        let limit = query.limit.clamp(1, MAX_LIMIT);
        let needle = format!("%{}%", escape_like_pattern(query_text));

        let mut logs = Vec::new();
        let mut total: u64 = 0;

        for partition in &partitions {
            let conn = self.client.connection()?;
            if !table_exists(&conn, partition).await? {
                continue;
            }

            let where_clause =
                "project_id = ?1 AND timestamp >= ?2 AND timestamp < ?3 AND (message LIKE ?4 ESCAPE '\\' OR error_message LIKE ?4 ESCAPE '\\')";
            let bind = params![
                project_id.to_string(),
                query.start_time.to_rfc3339(),
                query.end_time.to_rfc3339(),
                needle.clone()
            ];

            let count_sql = format!("SELECT COUNT(*) FROM {partition} WHERE {where_clause}");
            let mut count_rows = conn.query(&count_sql, bind.clone()).await.map_err(StoreError::Query)?;
            if let Some(row) = count_rows.next().await.map_err(StoreError::Query)? {
                let partition_total: i64 = row.get(0).map_err(|e| StoreError::Mapping(e.to_string()))?;
                total += partition_total as u64;
            }

            // Same per-partition-fetch-then-global-merge reasoning as
            // `query_logs`: OFFSET stays 0 here, the global offset is
            // applied to the merged result after the loop.
            let per_partition_fetch = query.offset as i64 + limit as i64;
            let select_sql = format!(
                "SELECT {COLUMNS} FROM {partition} WHERE {where_clause} ORDER BY timestamp DESC LIMIT ?5 OFFSET ?6"
            );
            let bind = params![
                project_id.to_string(),
                query.start_time.to_rfc3339(),
                query.end_time.to_rfc3339(),
                needle.clone(),
                per_partition_fetch,
                0i64
            ];
            let mut rows = conn.query(&select_sql, bind).await.map_err(StoreError::Query)?;
            while let Some(row) = rows.next().await.map_err(StoreError::Query)? {
                logs.push(row_to_event(&row)?);
            }
        }

        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let skip = (query.offset as usize).min(logs.len());
        logs.drain(0..skip);
        logs.truncate(limit as usize);
        let has_more = (query.offset as u64 + logs.len() as u64) < total;

        Ok(LogQueryPage { logs, total, has_more })
    }
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub persisted: u64,
    pub failed_rows: Vec<LogEvent>,
}

const COLUMNS: &str = "id, project_id, timestamp, ingested_at, level, log_type, importance, environment, \
release, message, error_type, error_message, stack_trace, attributes, sdk_version, platform, \
platform_version, processing_time_ms, error_fingerprint";

fn insert_sql(partition: &str) -> String {
    format!(
        "INSERT INTO {partition} ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
    )
}

fn row_params(row: &LogEvent) -> Result<Vec<libsql::Value>, StoreError> {
    let attributes = match &row.attributes {
        Some(value) => Some(serde_json::to_string(value).map_err(|e| StoreError::Mapping(e.to_string()))?),
        None => None,
    };

    Ok(params![
        row.id.expect("id assigned before insert"),
        row.project_id.clone(),
        row.timestamp.to_rfc3339(),
        row.ingested_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        row.level.as_str().to_string(),
        row.log_type.as_str().to_string(),
        row.importance.as_str().to_string(),
        row.environment.clone(),
        row.release.clone(),
        row.message.clone(),
        row.error_type.clone(),
        row.error_message.clone(),
        row.stack_trace.clone(),
        attributes,
        row.sdk_version.clone(),
        row.platform.clone(),
        row.platform_version.clone(),
        row.processing_time_ms,
        row.error_fingerprint.clone()
    ])
}

fn row_to_event(row: &libsql::Row) -> Result<LogEvent, StoreError> {
    let map_err = |e: libsql::Error| StoreError::Mapping(e.to_string());

    let timestamp_raw: String = row.get(2).map_err(map_err)?;
    let ingested_at_raw: String = row.get(3).map_err(map_err)?;
    let level_raw: String = row.get(4).map_err(map_err)?;
    let log_type_raw: String = row.get(5).map_err(map_err)?;
    let importance_raw: String = row.get(6).map_err(map_err)?;
    let attributes_raw: Option<String> = row.get(13).map_err(map_err)?;

    Ok(LogEvent {
        id: Some(row.get(0).map_err(map_err)?),
        project_id: row.get(1).map_err(map_err)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_raw)
            .map_err(|e| StoreError::Mapping(e.to_string()))?
            .with_timezone(&Utc),
        ingested_at: DateTime::parse_from_rfc3339(&ingested_at_raw)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        level: LogLevel::from_str(&level_raw)
            .ok_or_else(|| StoreError::Mapping(format!("unrecognized level column value '{level_raw}'")))?,
        log_type: LogType::from_str(&log_type_raw)
            .ok_or_else(|| StoreError::Mapping(format!("unrecognized log_type column value '{log_type_raw}'")))?,
        importance: Importance::from_str(&importance_raw)
            .ok_or_else(|| StoreError::Mapping(format!("unrecognized importance column value '{importance_raw}'")))?,
        environment: row.get(7).map_err(map_err)?,
        release: row.get(8).map_err(map_err)?,
        message: row.get(9).map_err(map_err)?,
        error_type: row.get(10).map_err(map_err)?,
        error_message: row.get(11).map_err(map_err)?,
        stack_trace: row.get(12).map_err(map_err)?,
        attributes: attributes_raw
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| StoreError::Mapping(e.to_string()))?,
        sdk_version: row.get(14).map_err(map_err)?,
        platform: row.get(15).map_err(map_err)?,
        platform_version: row.get(16).map_err(map_err)?,
        processing_time_ms: row.get(17).map_err(map_err)?,
        error_fingerprint: row.get(18).map_err(map_err)?,
    })
}

fn where_clause_for(project_id: &str, query: &LogQuery) -> (String, Vec<libsql::Value>) {
    let mut clause = String::from("project_id = ?1 AND timestamp >= ?2 AND timestamp < ?3");
    let mut bind = params![project_id.to_string(), query.start_time.to_rfc3339(), query.end_time.to_rfc3339()];
    let mut next = 4;

    if let Some(level) = &query.level {
        clause.push_str(&format!(" AND level = ?{next}"));
        bind.push(libsql::Value::Text(level.clone()));
        next += 1;
    }
    if let Some(log_type) = &query.log_type {
        clause.push_str(&format!(" AND log_type = ?{next}"));
        bind.push(libsql::Value::Text(log_type.clone()));
        next += 1;
    }
    if let Some(environment) = &query.environment {
        clause.push_str(&format!(" AND environment = ?{next}"));
        bind.push(libsql::Value::Text(environment.clone()));
        next += 1;
    }
    if let Some(fingerprint) = &query.error_fingerprint {
        clause.push_str(&format!(" AND error_fingerprint = ?{next}"));
        bind.push(libsql::Value::Text(fingerprint.clone()));
        next += 1;
    }
    let _ = next;

    (clause, bind)
}

/// Escapes `%`, `_`, and the escape character itself so a caller's search
/// text is matched literally in a `LIKE ... ESCAPE '\'` clause rather than
/// having `%`/`_` act as SQL wildcards.
fn escape_like_pattern(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

async fn table_exists(conn: &libsql::Connection, table: &str) -> Result<bool, StoreError> {
    let mut rows = conn
        .query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table.to_string()],
        )
        .await
        .map_err(StoreError::Query)?;
    Ok(rows.next().await.map_err(StoreError::Query)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_pattern_neutralizes_wildcards() {
        assert_eq!(escape_like_pattern("100%_off"), "100\\%\\_off");
        assert_eq!(escape_like_pattern("plain text"), "plain text");
        assert_eq!(escape_like_pattern("back\\slash"), "back\\\\slash");
    }
}
