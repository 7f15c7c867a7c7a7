use thiserror::Error;

/// Error taxonomy for the fast cache substrate: transient dependency
/// failures, quota/backpressure rejections, and permanent credential
/// failures, as surfaced by the identity cache, rate limiter and queue.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("credential rejected: {0}")]
    Rejected(String),
    #[error("transient failure reaching the Auth collaborator or Redis: {0}")]
    TransientAuth(String),
    #[error("credential is permanently invalid: {0}")]
    PermanentAuth(String),
    #[error("dependency circuit is open; retry after the cool-off")]
    CircuitOpen,
    #[error("redis operation failed: {0}")]
    Redis(String),
    #[error("payload failed to encode/decode: {0}")]
    Decode(String),
    #[error("per-project queue is at or above its depth ceiling")]
    QueueFull,
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Redis(err.to_string())
    }
}
