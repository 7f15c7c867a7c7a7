use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use logflux_cache::ResolveOutcome;
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::errors::ApiError;
use crate::state::{AppState, CredentialContext};

/// C2's credential-extraction + C1-resolve step. Accepts either an
/// `x-api-key` header (the SDK data-plane credential) or a bearer token
/// in `Authorization` (a session token for management-style calls); both
/// are opaque strings hashed before ever touching the cache, so the
/// plaintext credential is never stored.
fn extract_credential(req: &Request) -> Option<String> {
    if let Some(value) = req.headers().get("x-api-key") {
        return value.to_str().ok().map(str::to_string);
    }
    let auth = req.headers().get(axum::http::header::AUTHORIZATION)?;
    let raw = auth.to_str().ok()?;
    raw.strip_prefix("Bearer ").map(str::to_string)
}

fn hash_credential(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[instrument(skip_all)]
pub async fn auth_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let credential = extract_credential(&req).ok_or(ApiError::Unauthorized)?;
    let credential_hash = hash_credential(&credential);

    let outcome = state
        .identity_cache
        .resolve(&credential_hash)
        .await
        .map_err(|err| {
            warn!(error = %err, "identity cache resolve failed");
            ApiError::Internal(err.to_string())
        })?;

    let context = match outcome {
        ResolveOutcome::Resolved(record) => CredentialContext {
            credential_hash,
            project_id: record.project_id,
            account_id: record.account_id,
            daily_quota: record.daily_quota,
            retention_days: record.retention_days,
            rate_limit_per_minute: record.rate_limit_per_minute,
            rate_limit_per_hour: record.rate_limit_per_hour,
            stale: false,
        },
        ResolveOutcome::ResolvedStale(record) => CredentialContext {
            credential_hash,
            project_id: record.project_id,
            account_id: record.account_id,
            daily_quota: record.daily_quota,
            retention_days: record.retention_days,
            rate_limit_per_minute: record.rate_limit_per_minute,
            rate_limit_per_hour: record.rate_limit_per_hour,
            stale: true,
        },
        ResolveOutcome::Rejected => return Err(ApiError::Unauthorized),
        ResolveOutcome::Unavailable => {
            return Err(ApiError::CircuitOpen {
                retry_after_secs: state.settings.circuit_breaker_cool_off_secs,
            })
        }
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}
