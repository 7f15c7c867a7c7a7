use clap::Parser;

/// C4 tunables. Mirrors the gateway's `Settings` shape: `clap::Parser` with
/// `env` fallbacks, loaded once at startup after `.env` has been read.
#[derive(Debug, Clone, Parser)]
#[command(name = "logflux-storage-worker")]
pub struct Settings {
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    #[arg(long, env = "DATABASE_URL", default_value = "file:logflux.db")]
    pub database_url: String,

    #[arg(long, env = "TURSO_AUTH_TOKEN")]
    pub turso_auth_token: Option<String>,

    #[arg(long, env = "WORKER_ID", default_value_t = 1)]
    pub worker_id: u16,

    /// `B_max`: the most items a single flush will drain in one pass.
    #[arg(long, env = "BATCH_MAX_ITEMS", default_value_t = 1000)]
    pub batch_max_items: usize,

    /// `T_max`: how long a flush cycle waits to fill `batch_max_items`
    /// before flushing whatever it has.
    #[arg(long, env = "FLUSH_INTERVAL_MS", default_value_t = 200)]
    pub flush_interval_ms: u64,

    /// How often the supervisor re-scans Redis for newly-seen project
    /// queues and spawns a drain task for each.
    #[arg(long, env = "PROJECT_DISCOVERY_INTERVAL_SECS", default_value_t = 5)]
    pub project_discovery_interval_secs: u64,

    /// How often the partition lifecycle task runs.
    #[arg(long, env = "PARTITION_LIFECYCLE_INTERVAL_SECS", default_value_t = 3600)]
    pub partition_lifecycle_interval_secs: u64,

    /// Coarsest retention ceiling across all projects; a monthly partition
    /// entirely older than this is dropped. Per-project retention beyond
    /// this point is enforced at the query layer, not here.
    #[arg(long, env = "MAX_RETENTION_DAYS", default_value_t = 400)]
    pub max_retention_days: i64,
}
