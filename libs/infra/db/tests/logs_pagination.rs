use chrono::{Duration, TimeZone, Utc};
use logflux_db::{LogQuery, LogStoreClient, LogsRepository};
use logflux_models::{Importance, LogEvent, LogLevel, LogType};

fn event(project_id: &str, timestamp: chrono::DateTime<Utc>) -> LogEvent {
    LogEvent {
        id: None,
        project_id: project_id.to_string(),
        timestamp,
        ingested_at: Some(timestamp),
        level: LogLevel::Info,
        log_type: LogType::Console,
        importance: Importance::Standard,
        environment: None,
        release: None,
        message: "hello".to_string(),
        error_type: None,
        error_message: None,
        stack_trace: None,
        attributes: None,
        sdk_version: None,
        platform: None,
        platform_version: None,
        processing_time_ms: None,
        error_fingerprint: None,
    }
}

/// Reproduces spec.md §4.5's pagination contract across a query spanning
/// more than one monthly partition: offset paging must behave as if every
/// partition's rows were merged into one globally time-ordered list first,
/// not as if `LIMIT`/`OFFSET` were applied independently per partition.
#[tokio::test]
async fn offset_pagination_spans_partitions_correctly() {
    let db = LogStoreClient::connect(":memory:", None).await.expect("connect");
    let repo = LogsRepository::new(db, 1);

    let october = Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap();
    let november = Utc.with_ymd_and_hms(2025, 11, 15, 0, 0, 0).unwrap();

    // 60 events in October's partition, 60 in November's; each event's
    // timestamp is offset by a second so ordering is unambiguous.
    let mut events = Vec::new();
    for i in 0..60 {
        events.push(event("proj-1", october + Duration::seconds(i)));
    }
    for i in 0..60 {
        events.push(event("proj-1", november + Duration::seconds(i)));
    }
    let outcome = repo.insert_batch(events).await.expect("insert_batch");
    assert_eq!(outcome.persisted, 120);
    assert!(outcome.failed_rows.is_empty());

    let base_query = LogQuery {
        start_time: october - Duration::days(1),
        end_time: november + Duration::days(31),
        level: None,
        log_type: None,
        environment: None,
        error_fingerprint: None,
        limit: 100,
        offset: 0,
    };

    let page1 = repo.query_logs("proj-1", &base_query).await.expect("page 1");
    assert_eq!(page1.total, 120);
    assert_eq!(page1.logs.len(), 100);
    assert!(page1.has_more);

    let page2_query = LogQuery { offset: 100, ..base_query };
    let page2 = repo.query_logs("proj-1", &page2_query).await.expect("page 2");
    assert_eq!(page2.total, 120);
    assert_eq!(page2.logs.len(), 20, "the last 20 rows must still be reachable across the partition boundary");
    assert!(!page2.has_more);

    // No overlap between the two pages' ids.
    let page1_ids: std::collections::HashSet<_> = page1.logs.iter().map(|e| e.id).collect();
    for log in &page2.logs {
        assert!(!page1_ids.contains(&log.id), "page 2 must not repeat a row already returned in page 1");
    }
}
