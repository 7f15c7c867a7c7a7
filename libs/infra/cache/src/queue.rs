use std::time::Duration;

use logflux_models::QueueItem;
use redis::AsyncCommands;
use tracing::instrument;

use crate::errors::CacheError;
use crate::redis_client::RedisSubstrate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDepth {
    pub project_id: String,
    pub depth: u64,
}

fn queue_key(project_id: &str) -> String {
    format!("queue:logs:{project_id}")
}

/// C3's hand-off to C4: one Redis list per project, MessagePack-encoded
/// `QueueItem`s pushed on the left, drained by the storage worker with a
/// blocking pop so it never busy-polls an empty project.
pub struct ProjectQueue {
    redis: RedisSubstrate,
    depth_ceiling: u64,
}

impl ProjectQueue {
    pub fn new(redis: RedisSubstrate, depth_ceiling: u64) -> Self {
        Self { redis, depth_ceiling }
    }

    #[instrument(skip(self, item))]
    pub async fn enqueue(&self, project_id: &str, item: &QueueItem) -> Result<(), CacheError> {
        let key = queue_key(project_id);
        let mut conn = self.redis.connection();

        let depth: u64 = conn.llen(&key).await.map_err(CacheError::from)?;
        if depth >= self.depth_ceiling {
            return Err(CacheError::QueueFull);
        }

        let encoded = item.encode().map_err(|e| CacheError::Decode(e.to_string()))?;
        let _: () = conn.lpush(&key, encoded).await.map_err(CacheError::from)?;
        Ok(())
    }

    pub async fn depth(&self, project_id: &str) -> Result<QueueDepth, CacheError> {
        let mut conn = self.redis.connection();
        let depth: u64 = conn.llen(queue_key(project_id)).await.map_err(CacheError::from)?;
        Ok(QueueDepth {
            project_id: project_id.to_string(),
            depth,
        })
    }

    /// Blocking pop used by the storage worker's drain loop, bounded by
    /// `timeout` so the worker can still flush a partial batch on a quiet
    /// project.
    pub async fn dequeue_blocking(
        &self,
        project_id: &str,
        timeout: Duration,
    ) -> Result<Option<QueueItem>, CacheError> {
        let mut conn = self.redis.dedicated_connection().await?;
        let result: Option<(String, Vec<u8>)> = conn
            .brpop(queue_key(project_id), timeout.as_secs_f64())
            .await
            .map_err(CacheError::from)?;

        match result {
            Some((_key, bytes)) => {
                let item = QueueItem::decode(&bytes).map_err(|e| CacheError::Decode(e.to_string()))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    pub async fn known_project_ids(&self) -> Result<Vec<String>, CacheError> {
        let mut conn = self.redis.connection();
        let keys: Vec<String> = conn.keys("queue:logs:*").await.map_err(CacheError::from)?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix("queue:logs:").map(str::to_string))
            .collect())
    }
}
