use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::errors::ApiError;
use crate::state::AppState;

/// Bounds every request to `settings.request_deadline_secs`. Applied
/// before the SSE stream route is mounted, since a long-lived connection
/// is the point of that endpoint, not a request that's overrunning.
pub async fn deadline_layer(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    match tokio::time::timeout(state.settings.request_deadline(), next.run(req)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            warn!(deadline_secs = state.settings.request_deadline_secs, "request exceeded its deadline");
            Err(ApiError::Timeout)
        }
    }
}
