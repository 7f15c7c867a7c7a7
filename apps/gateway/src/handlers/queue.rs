use axum::extract::State;
use axum::{Extension, Json};
use logflux_cache::QueueDepth;
use tracing::instrument;

use crate::errors::ApiError;
use crate::state::{AppState, CredentialContext};

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn queue_depth(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
) -> Result<Json<QueueDepth>, ApiError> {
    let depth = state
        .queue
        .depth(&context.project_id)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(depth))
}
