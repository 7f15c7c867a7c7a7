use redis::AsyncCommands;
use tracing::instrument;

use crate::errors::CacheError;
use crate::redis_client::RedisSubstrate;

#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    pub default_per_minute: u32,
    pub default_per_hour: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            default_per_minute: 600,
            default_per_hour: 20_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

/// Fixed-window counters: one INCR+EXPIRE bucket per minute and per hour.
/// A request is admitted only if both windows have headroom; the window
/// closest to tripping determines the reported `limit`/`remaining`/
/// `retry_after_secs` so callers can set `Retry-After` accurately.
pub struct RateLimiter {
    redis: RedisSubstrate,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(redis: RedisSubstrate, config: RateLimiterConfig) -> Self {
        Self { redis, config }
    }

    #[instrument(skip(self))]
    pub async fn check(
        &self,
        project_id: &str,
        per_minute: Option<u32>,
        per_hour: Option<u32>,
    ) -> Result<RateLimitDecision, CacheError> {
        let minute = self
            .bump_window(project_id, "minute", 60, per_minute.unwrap_or(self.config.default_per_minute))
            .await?;
        let hour = self
            .bump_window(project_id, "hour", 3600, per_hour.unwrap_or(self.config.default_per_hour))
            .await?;

        if !minute.allowed {
            Ok(minute)
        } else if !hour.allowed {
            Ok(hour)
        } else {
            Ok(minute)
        }
    }

    async fn bump_window(
        &self,
        project_id: &str,
        bucket: &str,
        window_secs: u64,
        limit: u32,
    ) -> Result<RateLimitDecision, CacheError> {
        let epoch_bucket = current_epoch_secs() / window_secs;
        let key = format!("ratelimit:{bucket}:{project_id}:{epoch_bucket}");

        let mut conn = self.redis.connection();
        let count: u64 = conn.incr(&key, 1).await.map_err(CacheError::from)?;
        if count == 1 {
            let _: () = conn.expire(&key, window_secs as i64).await.map_err(CacheError::from)?;
        }

        let remaining = (limit as i64 - count as i64).max(0) as u32;
        let elapsed_in_window = current_epoch_secs() % window_secs;
        let retry_after_secs = window_secs - elapsed_in_window;

        Ok(RateLimitDecision {
            allowed: count <= limit as u64,
            limit,
            remaining,
            retry_after_secs,
        })
    }
}

fn current_epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock should be after the unix epoch")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_key_changes_every_window() {
        let a = current_epoch_secs() / 60;
        let b = (current_epoch_secs() + 60) / 60;
        assert_ne!(a, b);
    }
}
