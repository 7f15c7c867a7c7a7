use clap::Parser;

/// Cadences and windows for the five scheduled jobs in the pre-aggregator
/// (spec.md §4.5's cadence table). Every job also honors `lag_secs`: it
/// scans `[now - window, now - lag]` rather than up to `now`, so the
/// still-filling current bucket is never double-counted across runs.
#[derive(Debug, Clone, Parser)]
#[command(name = "logflux-analytics-worker")]
pub struct Settings {
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    #[arg(long, env = "DATABASE_URL", default_value = "file:logflux.db")]
    pub database_url: String,

    #[arg(long, env = "TURSO_AUTH_TOKEN")]
    pub turso_auth_token: Option<String>,

    #[arg(long, env = "LAG_SECS", default_value_t = 30)]
    pub lag_secs: i64,

    #[arg(long, env = "ERROR_RATE_CADENCE_SECS", default_value_t = 300)]
    pub error_rate_cadence_secs: u64,
    #[arg(long, env = "ERROR_RATE_WINDOW_HOURS", default_value_t = 24)]
    pub error_rate_window_hours: i64,
    #[arg(long, env = "ERROR_RATE_BUCKET_MINUTES", default_value_t = 5)]
    pub error_rate_bucket_minutes: i64,

    #[arg(long, env = "LOG_VOLUME_CADENCE_SECS", default_value_t = 300)]
    pub log_volume_cadence_secs: u64,
    #[arg(long, env = "LOG_VOLUME_WINDOW_HOURS", default_value_t = 24)]
    pub log_volume_window_hours: i64,
    #[arg(long, env = "LOG_VOLUME_BUCKET_MINUTES", default_value_t = 5)]
    pub log_volume_bucket_minutes: i64,

    #[arg(long, env = "TOP_ERRORS_CADENCE_SECS", default_value_t = 900)]
    pub top_errors_cadence_secs: u64,
    #[arg(long, env = "TOP_ERRORS_WINDOW_HOURS", default_value_t = 24)]
    pub top_errors_window_hours: i64,
    #[arg(long, env = "TOP_ERRORS_LIMIT", default_value_t = 50)]
    pub top_errors_limit: u32,

    #[arg(long, env = "USAGE_STATS_CADENCE_SECS", default_value_t = 3600)]
    pub usage_stats_cadence_secs: u64,
    #[arg(long, env = "USAGE_STATS_WINDOW_DAYS", default_value_t = 30)]
    pub usage_stats_window_days: i64,
    /// Quota lookup is an external-collaborator concern (project CRUD is
    /// out of scope); this worker reports usage against a configured
    /// default rather than a per-project value it has no way to fetch.
    #[arg(long, env = "DEFAULT_DAILY_QUOTA", default_value_t = 1_000_000)]
    pub default_daily_quota: u64,

    #[arg(long, env = "AGGREGATED_METRICS_CADENCE_SECS", default_value_t = 3600)]
    pub aggregated_metrics_cadence_secs: u64,

    /// Cache TTL for every cache-sink job, expressed as a multiple of that
    /// job's cadence (spec.md §4.5: "cache with TTL ≥ 2x cadence").
    #[arg(long, env = "CACHE_TTL_CADENCE_MULTIPLE", default_value_t = 2)]
    pub cache_ttl_cadence_multiple: u64,

    /// Largest page size used when paginating `query_logs`/`search_logs`
    /// while scanning a window — independent of the API-facing page size.
    #[arg(long, env = "SCAN_PAGE_SIZE", default_value_t = 1000)]
    pub scan_page_size: u32,
}
