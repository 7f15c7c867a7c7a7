//! Wire and storage data model for the logflux ingestion/query pipeline.
//!
//! Every type here is a plain, serde-serializable record. Validation is a
//! pure function (`RawLogEvent::validate`) — no I/O, no clock reads beyond
//! what the caller supplies.

mod credential;
mod error_group;
mod fingerprint;
mod log_event;
mod metric_views;
mod metrics;
mod notification;
mod partition;
mod queue_item;

pub use credential::CredentialRecord;
pub use error_group::{ErrorGroup, ErrorGroupStatus};
pub use fingerprint::compute_fingerprint;
pub use log_event::{
    Importance, LogEvent, LogLevel, LogType, RawLogEvent, ValidationError, MAX_ATTRIBUTES_BYTES,
    MAX_ERROR_MESSAGE_BYTES, MAX_MESSAGE_BYTES, MAX_STACK_TRACE_BYTES,
};
pub use metric_views::{ErrorRatePoint, LogVolumePoint, TopErrorView, UsageStatsDay};
pub use metrics::{AggregatedMetric, MetricType};
pub use notification::ErrorNotification;
pub use partition::{partition_name, partition_range, partitions_overlapping};
pub use queue_item::QueueItem;
