use std::sync::Arc;
use std::time::Duration;

use logflux_models::CredentialRecord;
use logflux_rpc::{AuthCollaborator, RpcError};
use redis::AsyncCommands;
use tracing::{instrument, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::errors::CacheError;
use crate::redis_client::RedisSubstrate;

#[derive(Debug, Clone, Copy)]
pub struct IdentityCacheConfig {
    pub primary_ttl: Duration,
    pub emergency_ttl: Duration,
}

impl Default for IdentityCacheConfig {
    fn default() -> Self {
        Self {
            primary_ttl: Duration::from_secs(300),
            emergency_ttl: Duration::from_secs(6 * 3600),
        }
    }
}

/// How long an `invalidate`d credential's tombstone shadows the primary
/// cache. Brief by design: just long enough to outlast a refresh that was
/// already in flight when the invalidation landed.
const NEGATIVE_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    /// Fresh answer, either from the primary cache or a live collaborator call.
    Resolved(CredentialRecord),
    /// The Auth collaborator is unreachable (breaker open or call failed)
    /// but a recent answer was still sitting in the emergency cache.
    ResolvedStale(CredentialRecord),
    /// The collaborator authoritatively said this credential doesn't exist
    /// or was revoked; never served from the emergency cache.
    Rejected,
    /// No cached answer and the collaborator is unreachable.
    Unavailable,
}

fn primary_key(credential_hash: &str) -> String {
    format!("identity:primary:{credential_hash}")
}

fn emergency_key(credential_hash: &str) -> String {
    format!("identity:emergency:{credential_hash}")
}

fn negative_key(credential_hash: &str) -> String {
    format!("identity:negative:{credential_hash}")
}

/// C1: resolves a credential hash to a `CredentialRecord`, backed by a
/// short-TTL primary cache and a long-TTL emergency cache that is only
/// consulted once the breaker guarding the Auth collaborator has tripped.
pub struct IdentityCache {
    redis: RedisSubstrate,
    collaborator: Arc<dyn AuthCollaborator>,
    breaker: CircuitBreaker,
    config: IdentityCacheConfig,
}

impl IdentityCache {
    pub fn new(
        redis: RedisSubstrate,
        collaborator: Arc<dyn AuthCollaborator>,
        config: IdentityCacheConfig,
    ) -> Self {
        Self::with_breaker_config(redis, collaborator, config, CircuitBreakerConfig::default())
    }

    pub fn with_breaker_config(
        redis: RedisSubstrate,
        collaborator: Arc<dyn AuthCollaborator>,
        config: IdentityCacheConfig,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        Self {
            redis,
            collaborator,
            breaker: CircuitBreaker::new(breaker_config),
            config,
        }
    }

    /// Exposed so callers (the rate-limit middleware's `CircuitOpen`
    /// branch, tests) can observe the breaker without reaching into a
    /// private field.
    pub fn breaker_state(&self) -> crate::circuit_breaker::CircuitState {
        self.breaker.state()
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, credential_hash: &str) -> Result<ResolveOutcome, CacheError> {
        let mut conn = self.redis.connection();

        // A tombstone from a concurrent `invalidate` shadows the primary
        // cache for its brief TTL, so a refresh that was already in flight
        // when the invalidation landed can't resurrect the stale entry.
        let tombstoned: Option<Vec<u8>> = conn.get(negative_key(credential_hash)).await.map_err(CacheError::from)?;

        if tombstoned.is_none() {
            if let Some(record) = read_cached(&mut conn, &primary_key(credential_hash)).await? {
                return Ok(ResolveOutcome::Resolved(record));
            }
        }

        if !self.breaker.allow_request() {
            return Ok(self.serve_emergency(credential_hash).await?);
        }

        match self.collaborator.lookup_credential(credential_hash).await {
            Ok(record) => {
                self.breaker.record_success();
                self.store(credential_hash, &record).await?;
                Ok(ResolveOutcome::Resolved(record))
            }
            Err(RpcError::NotFound) | Err(RpcError::Revoked) => {
                self.breaker.record_success();
                let _: () = conn.del(emergency_key(credential_hash)).await.map_err(CacheError::from)?;
                Ok(ResolveOutcome::Rejected)
            }
            Err(err) => {
                self.breaker.record_failure();
                warn!(error = %err, "Auth collaborator lookup failed, falling back to emergency cache");
                self.serve_emergency(credential_hash).await
            }
        }
    }

    /// Removes the primary cache entry for `credential_hash`; the emergency
    /// mirror is left untouched so the breaker-open fallback path keeps
    /// working. A brief tombstone is written alongside the deletion so a
    /// `resolve` that already fetched a fresh answer before this call can't
    /// write it back into the primary cache and undo the invalidation.
    #[instrument(skip(self))]
    pub async fn invalidate(&self, credential_hash: &str) -> Result<(), CacheError> {
        let mut conn = self.redis.connection();
        let _: () = conn.del(primary_key(credential_hash)).await.map_err(CacheError::from)?;
        let _: () = conn
            .set_ex(negative_key(credential_hash), vec![1u8], NEGATIVE_CACHE_TTL.as_secs())
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }

    async fn serve_emergency(&self, credential_hash: &str) -> Result<ResolveOutcome, CacheError> {
        let mut conn = self.redis.connection();
        match read_cached(&mut conn, &emergency_key(credential_hash)).await? {
            Some(record) => Ok(ResolveOutcome::ResolvedStale(record)),
            None => Ok(ResolveOutcome::Unavailable),
        }
    }

    async fn store(&self, credential_hash: &str, record: &CredentialRecord) -> Result<(), CacheError> {
        let mut conn = self.redis.connection();
        let encoded = serde_json::to_vec(record).map_err(|e| CacheError::Decode(e.to_string()))?;
        let _: () = conn
            .set_ex(primary_key(credential_hash), encoded.clone(), self.config.primary_ttl.as_secs())
            .await
            .map_err(CacheError::from)?;
        let _: () = conn
            .set_ex(emergency_key(credential_hash), encoded, self.config.emergency_ttl.as_secs())
            .await
            .map_err(CacheError::from)?;
        Ok(())
    }
}

async fn read_cached(
    conn: &mut redis::aio::ConnectionManager,
    key: &str,
) -> Result<Option<CredentialRecord>, CacheError> {
    let raw: Option<Vec<u8>> = conn.get(key).await.map_err(CacheError::from)?;
    match raw {
        Some(bytes) => {
            let record = serde_json::from_slice(&bytes).map_err(|e| CacheError::Decode(e.to_string()))?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}
