use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Top-level error every gateway handler returns. Maps spec.md §7's
/// taxonomy onto an HTTP status plus `{ "detail": ... }` body, attaching
/// the rate-limit/backpressure headers where specified.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated")]
    Unauthorized,
    #[error("credential valid but not authorized for this project")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("rate limit exceeded")]
    RateLimited { limit: u32, remaining: u32, retry_after_secs: u64 },
    #[error("dependency circuit is open")]
    CircuitOpen { retry_after_secs: u64 },
    #[error("per-project queue is at or above its depth ceiling")]
    QueueFull { retry_after_secs: u64 },
    #[error("internal error: {0}")]
    Internal(String),
    #[error("request exceeded its deadline")]
    Timeout,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail, extra_headers): (StatusCode, String, Vec<(HeaderName, String)>) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), vec![]),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string(), vec![]),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string(), vec![]),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string(), vec![]),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, self.to_string(), vec![]),
            ApiError::RateLimited { limit, remaining, retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "rate limit of {limit} requests exceeded; {remaining} remaining in the current window, retry in {retry_after_secs}s"
                ),
                vec![
                    (HeaderName::from_static("retry-after"), retry_after_secs.to_string()),
                    (HeaderName::from_static("x-ratelimit-limit"), limit.to_string()),
                    (HeaderName::from_static("x-ratelimit-remaining"), remaining.to_string()),
                    (HeaderName::from_static("x-ratelimit-reset"), retry_after_secs.to_string()),
                ],
            ),
            ApiError::CircuitOpen { retry_after_secs } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service unavailable: a dependency's circuit breaker is open".to_string(),
                vec![(HeaderName::from_static("retry-after"), retry_after_secs.to_string())],
            ),
            ApiError::QueueFull { retry_after_secs } => (
                StatusCode::SERVICE_UNAVAILABLE,
                self.to_string(),
                vec![(HeaderName::from_static("retry-after"), retry_after_secs.to_string())],
            ),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string(), vec![]),
            ApiError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string(), vec![]),
        };

        let mut response = (status, Json(ErrorBody { detail })).into_response();
        for (name, value) in extra_headers {
            if let Ok(value) = HeaderValue::from_str(&value) {
                response.headers_mut().insert(name, value);
            }
        }
        response
    }
}
