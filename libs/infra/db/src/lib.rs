//! The logs store: a libSQL/Turso-compatible relational database holding
//! monthly time-partitioned log tables, error-group aggregates, and
//! pre-aggregated metrics. C4 (storage worker) owns all writes here
//! except the metrics cache; C5 (query & analytics) only reads.

mod client;
mod errors;
mod id_gen;
mod repositories;
mod schema;

pub use client::LogStoreClient;
pub use errors::StoreError;
pub use id_gen::LogIdGenerator;
pub use repositories::{
    AggregatedMetricsRepository, BatchOutcome, DeadLetterRepository, ErrorGroupRepository,
    IngestionMetricsRepository, IngestionMetricsSample, LogQuery, LogQueryPage, LogsRepository, DEFAULT_LIMIT,
    MAX_LIMIT,
};
pub use schema::{drop_partition, ensure_ingestion_metrics_partition, ensure_logs_partition};
