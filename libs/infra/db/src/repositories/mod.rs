mod aggregated_metrics;
mod dead_letter;
mod error_groups;
mod ingestion_metrics;
mod logs;

pub use aggregated_metrics::AggregatedMetricsRepository;
pub use dead_letter::DeadLetterRepository;
pub use error_groups::ErrorGroupRepository;
pub use ingestion_metrics::{IngestionMetricsRepository, IngestionMetricsSample};
pub use logs::{BatchOutcome, LogQuery, LogQueryPage, LogsRepository, DEFAULT_LIMIT, MAX_LIMIT};
