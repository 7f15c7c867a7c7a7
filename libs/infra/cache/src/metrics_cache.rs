use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::errors::CacheError;
use crate::redis_client::RedisSubstrate;

fn cache_key(project_id: &str, metric_kind: &str) -> String {
    format!("metrics:{metric_kind}:{project_id}")
}

/// Holds the pre-aggregated views the analytics worker produces on its
/// cadence (error rate, log volume, top errors, usage stats) so the
/// gateway's read path never recomputes them on request. Each `metric_kind`
/// owns its own TTL-bounded key; the worker overwrites wholesale on every
/// run rather than patching individual entries. Generic over the payload
/// shape since each job's bucket (`ErrorRatePoint`, `LogVolumePoint`,
/// `TopErrorView`, `UsageStatsDay`) has its own fields.
pub struct MetricsCache {
    redis: RedisSubstrate,
}

impl MetricsCache {
    pub fn new(redis: RedisSubstrate) -> Self {
        Self { redis }
    }

    #[instrument(skip(self, value))]
    pub async fn replace<T: Serialize>(
        &self,
        project_id: &str,
        metric_kind: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let encoded = serde_json::to_vec(value).map_err(|e| CacheError::Decode(e.to_string()))?;
        let mut conn = self.redis.connection();
        let _: () = conn
            .set_ex(cache_key(project_id, metric_kind), encoded, ttl_secs)
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    pub async fn fetch<T: DeserializeOwned>(
        &self,
        project_id: &str,
        metric_kind: &str,
    ) -> Result<Option<T>, CacheError> {
        let mut conn = self.redis.connection();
        let raw: Option<Vec<u8>> = conn.get(cache_key(project_id, metric_kind)).await.map_err(CacheError::from)?;
        match raw {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
