use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error_group::ErrorGroupStatus;

/// One bucket of the `error_rate` pre-aggregation, cached at `interval`
/// resolution (default 5 m) over the trailing 24 h window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRatePoint {
    pub timestamp: DateTime<Utc>,
    pub error_count: u64,
    pub critical_count: u64,
}

/// One bucket of the `log_volume` pre-aggregation, one counter per level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogVolumePoint {
    pub timestamp: DateTime<Utc>,
    pub debug: u64,
    pub info: u64,
    pub warning: u64,
    pub error: u64,
    pub critical: u64,
}

/// One row of the `top_errors` pre-aggregation: a fingerprint ranked by
/// occurrence count within the scanned window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopErrorView {
    pub fingerprint: String,
    pub error_type: String,
    pub error_message: String,
    pub occurrence_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub sample_log_id: Option<i64>,
    pub status: ErrorGroupStatus,
}

/// One day of the `usage_stats` pre-aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStatsDay {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub log_count: u64,
    pub daily_quota: u64,
    pub quota_used_percent: f64,
}
