use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Exception,
    Endpoint,
    LogVolume,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Exception => "exception",
            MetricType::Endpoint => "endpoint",
            MetricType::LogVolume => "log_volume",
        }
    }
}

/// One bucket of `(project_id, date, hour, metric_type, ...dimension)`
/// pre-aggregation, written by the analytics worker and read by the
/// metrics query handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub project_id: String,
    /// `YYYYMMDD`.
    pub date: u32,
    pub hour: u8,
    pub metric_type: MetricType,
    pub endpoint_method: Option<String>,
    pub endpoint_path: Option<String>,
    pub log_level: Option<String>,
    pub log_type: Option<String>,
    pub log_count: u64,
    pub error_count: u64,
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub p95_duration_ms: f64,
    pub p99_duration_ms: f64,
}
