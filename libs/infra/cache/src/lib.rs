//! The fast cache substrate: one Redis deployment backing the credential
//! cache, rate counters, per-project queues, pre-aggregated metrics, and
//! the cross-process notification bus. Every module here owns one of
//! those responsibilities; `CacheError` is the single error type they
//! share so the gateway's error-mapping layer has one taxonomy to reason
//! about.

mod circuit_breaker;
mod errors;
mod identity_cache;
mod metrics_cache;
mod notification_bus;
mod queue;
mod rate_limiter;
mod redis_client;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use errors::CacheError;
pub use identity_cache::{IdentityCache, IdentityCacheConfig, ResolveOutcome};
pub use metrics_cache::MetricsCache;
pub use notification_bus::{NotificationBus, NotificationHub};
pub use queue::{ProjectQueue, QueueDepth};
pub use rate_limiter::{RateLimitDecision, RateLimiter, RateLimiterConfig};
pub use redis_client::RedisSubstrate;
