use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::errors::CacheError;

/// Thin handle onto the shared Redis deployment. `ConnectionManager`
/// multiplexes and auto-reconnects, so a single clone is handed to every
/// cache/queue/bus module rather than each owning its own pool.
#[derive(Clone)]
pub struct RedisSubstrate {
    manager: ConnectionManager,
    client: Client,
}

impl RedisSubstrate {
    #[instrument(skip(redis_url))]
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = Client::open(redis_url).map_err(CacheError::from)?;
        let manager = client.get_connection_manager().await.map_err(CacheError::from)?;
        info!("fast cache substrate connected");
        Ok(Self { manager, client })
    }

    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// A fresh, non-multiplexed connection — required for pub/sub and
    /// blocking list pops, which must not share the multiplexed
    /// connection used for ordinary commands.
    pub async fn dedicated_connection(&self) -> Result<redis::aio::Connection, CacheError> {
        self.client.get_async_connection().await.map_err(CacheError::from)
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }
}
