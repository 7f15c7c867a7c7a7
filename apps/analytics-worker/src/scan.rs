use chrono::{DateTime, Utc};
use logflux_db::{LogQuery, LogsRepository, StoreError};
use logflux_models::LogEvent;

/// Paginates `query_logs` to collect every event in `[start, end)` for one
/// project. `LogsRepository` only offers offset pagination today; a
/// keyset scan on `(timestamp, id)` would avoid the O(offset) cost on
/// wide windows, but that entry point doesn't exist yet (see DESIGN.md).
pub async fn scan_window(
    logs: &LogsRepository,
    project_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    page_size: u32,
) -> Result<Vec<LogEvent>, StoreError> {
    let mut collected = Vec::new();
    let mut offset = 0u32;

    loop {
        let query = LogQuery {
            start_time: start,
            end_time: end,
            level: None,
            log_type: None,
            environment: None,
            error_fingerprint: None,
            limit: page_size,
            offset,
        };
        let page = logs.query_logs(project_id, &query).await?;
        let fetched = page.logs.len() as u32;
        collected.extend(page.logs);

        if !page.has_more || fetched == 0 {
            break;
        }
        offset += fetched;
    }

    Ok(collected)
}

/// Lightweight variant for jobs that only need a count, not the rows —
/// `query_logs`'s `total` already comes from a `COUNT(*)`, so a `limit: 1`
/// call gets the day's count without materializing a single row.
pub async fn count_window(
    logs: &LogsRepository,
    project_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64, StoreError> {
    let query = LogQuery {
        start_time: start,
        end_time: end,
        level: None,
        log_type: None,
        environment: None,
        error_fingerprint: None,
        limit: 1,
        offset: 0,
    };
    Ok(logs.query_logs(project_id, &query).await?.total)
}
