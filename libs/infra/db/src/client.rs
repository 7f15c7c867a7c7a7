//! Connection management for the log store (libSQL/Turso-compatible).
//!
//! Unlike the account/project tables a relational schema would normally
//! carry once and forever, logs and their derived tables are partitioned
//! by calendar month (`logs_YYYY_MM`, `ingestion_metrics_YYYY_MM`) because
//! libSQL has no native declarative partitioning. This client only owns
//! the connection and the handful of tables that exist exactly once
//! (`error_groups`, `dead_letter_logs`, `aggregated_metrics`); partition
//! tables are created on demand by `crate::schema::ensure_partition`.

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{info, instrument};

use crate::errors::StoreError;
use crate::schema;

#[derive(Clone)]
pub struct LogStoreClient {
    database: Arc<Database>,
    /// Kept alive for in-memory URLs so SQLite doesn't reclaim the schema
    /// the moment the bootstrap connection is dropped.
    _memory_anchor: Option<Arc<Connection>>,
}

impl LogStoreClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(database_url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        if database_url.is_empty() {
            return Err(StoreError::Configuration("DATABASE_URL is empty".into()));
        }

        let is_remote = database_url.starts_with("libsql://") || database_url.starts_with("https://");
        let is_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let database = if is_remote {
            let token = auth_token
                .ok_or_else(|| StoreError::Configuration("remote store requires an auth token".into()))?;
            Builder::new_remote(database_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_url).build().await
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let conn = database.connect().map_err(|e| StoreError::Connection(e.to_string()))?;
            schema::apply_base_schema(&conn).await?;
            anchor = Some(Arc::new(conn));
        } else {
            let conn = database.connect().map_err(|e| StoreError::Connection(e.to_string()))?;
            schema::apply_base_schema(&conn).await?;
        }

        info!(remote = is_remote, memory = is_memory, "log store connected");
        Ok(Self {
            database,
            _memory_anchor: anchor,
        })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.database.connect().map_err(|e| StoreError::Connection(e.to_string()))
    }
}
