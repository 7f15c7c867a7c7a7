use chrono::Utc;
use logflux_db::LogStoreClient;
use logflux_models::partition_name;
use logflux_storage_worker::partition_lifecycle;

#[tokio::test]
async fn tick_creates_current_and_next_month_partitions() {
    let db = LogStoreClient::connect(":memory:", None).await.expect("connect");

    partition_lifecycle::tick(&db, 400).await.expect("tick succeeds");

    let conn = db.connection().expect("connection");
    let now = Utc::now();
    let next_month = now.checked_add_months(chrono::Months::new(1)).unwrap();

    for partition in [partition_name("logs", now), partition_name("logs", next_month)] {
        let mut rows = conn
            .query(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                libsql::params![partition.clone()],
            )
            .await
            .expect("query sqlite_master");
        assert!(rows.next().await.expect("row").is_some(), "expected partition {partition} to exist");
    }
}

#[tokio::test]
async fn tick_is_idempotent() {
    let db = LogStoreClient::connect(":memory:", None).await.expect("connect");
    partition_lifecycle::tick(&db, 400).await.expect("first tick succeeds");
    partition_lifecycle::tick(&db, 400).await.expect("second tick on an already-provisioned store succeeds");
}
