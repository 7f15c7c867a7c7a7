use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::instrument;

use crate::errors::ApiError;
use crate::state::{AppState, CredentialContext};

/// Sliding/fixed-window rate limit, keyed by the `project_id` resolved
/// upstream by [`crate::middleware::auth_layer`] — every credential on a
/// project shares one budget (see DESIGN.md's open-question rationale:
/// this keeps quota accounting consistent with the per-project
/// `usage_stats` job rather than isolating per credential). Successful
/// responses carry `Limit`/`Remaining`/`Reset` headers; rejections carry
/// the same plus `Retry-After`, attached by `ApiError::RateLimited`.
#[instrument(skip_all)]
pub async fn rate_limit_layer(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    let context = req
        .extensions()
        .get::<CredentialContext>()
        .cloned()
        .expect("auth_layer must run before rate_limit_layer");

    let decision = state
        .rate_limiter
        .check(&context.project_id, context.rate_limit_per_minute, context.rate_limit_per_hour)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    if !decision.allowed {
        return Err(ApiError::RateLimited {
            limit: decision.limit,
            remaining: decision.remaining,
            retry_after_secs: decision.retry_after_secs,
        });
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.retry_after_secs));
    Ok(response)
}
