use std::time::Duration;

use clap::Parser;

/// Every tunable spec.md §6 documents, loaded once at startup. `.env` is
/// read first in debug builds (`dotenvy::dotenv()` in `main`); the process
/// environment always wins over `.env`.
#[derive(Debug, Clone, Parser)]
#[command(name = "logflux-gateway")]
pub struct Settings {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    #[arg(long, env = "DATABASE_URL", default_value = "file:logflux.db")]
    pub database_url: String,

    #[arg(long, env = "TURSO_AUTH_TOKEN")]
    pub turso_auth_token: Option<String>,

    /// Endpoint of the external Auth collaborator (account/API-key CRUD —
    /// out of scope here, consumed only through `AuthCollaborator`).
    #[arg(long, env = "AUTH_COLLABORATOR_ENDPOINT", default_value = "http://127.0.0.1:9000/rpc/credential-lookup")]
    pub auth_collaborator_endpoint: String,

    #[arg(long, env = "IDENTITY_CACHE_PRIMARY_TTL_SECS", default_value_t = 300)]
    pub identity_cache_primary_ttl_secs: u64,

    #[arg(long, env = "IDENTITY_CACHE_EMERGENCY_TTL_SECS", default_value_t = 21_600)]
    pub identity_cache_emergency_ttl_secs: u64,

    #[arg(long, env = "RATE_LIMIT_DEFAULT_PER_MINUTE", default_value_t = 600)]
    pub rate_limit_default_per_minute: u32,

    #[arg(long, env = "RATE_LIMIT_DEFAULT_PER_HOUR", default_value_t = 20_000)]
    pub rate_limit_default_per_hour: u32,

    #[arg(long, env = "CIRCUIT_BREAKER_CONSECUTIVE_FAILURES", default_value_t = 5)]
    pub circuit_breaker_consecutive_failures: u32,

    #[arg(long, env = "CIRCUIT_BREAKER_WINDOW_SIZE", default_value_t = 20)]
    pub circuit_breaker_window_size: usize,

    #[arg(long, env = "CIRCUIT_BREAKER_WINDOW_FAILURE_RATIO", default_value_t = 0.5)]
    pub circuit_breaker_window_failure_ratio: f64,

    #[arg(long, env = "CIRCUIT_BREAKER_COOL_OFF_SECS", default_value_t = 30)]
    pub circuit_breaker_cool_off_secs: u64,

    #[arg(long, env = "QUEUE_DEPTH_CEILING", default_value_t = 100_000)]
    pub queue_depth_ceiling: u64,

    #[arg(long, env = "QUEUE_FULL_RETRY_AFTER_SECS", default_value_t = 60)]
    pub queue_full_retry_after_secs: u64,

    #[arg(long, env = "INGEST_BATCH_MAX_ITEMS", default_value_t = 1000)]
    pub ingest_batch_max_items: usize,

    #[arg(long, env = "DEFAULT_QUERY_WINDOW_HOURS", default_value_t = 24)]
    pub default_query_window_hours: i64,

    #[arg(long, env = "REQUEST_DEADLINE_SECS", default_value_t = 30)]
    pub request_deadline_secs: u64,

    #[arg(long, env = "WORKER_ID", default_value_t = 1)]
    pub worker_id: u16,
}

impl Settings {
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}
