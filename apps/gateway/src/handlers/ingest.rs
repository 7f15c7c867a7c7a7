use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use logflux_cache::CacheError;
use logflux_models::{ErrorNotification, QueueItem, RawLogEvent};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::errors::ApiError;
use crate::state::{AppState, CredentialContext};

#[derive(Debug, Serialize)]
pub struct RejectedItem {
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub accepted: usize,
    pub rejected: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RejectedItem>,
}

impl IntoResponse for IngestResponse {
    fn into_response(self) -> Response {
        let status = if self.accepted > 0 {
            StatusCode::ACCEPTED
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(self)).into_response()
    }
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn ingest_single(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Json(event): Json<RawLogEvent>,
) -> Result<IngestResponse, ApiError> {
    ingest_batch_inner(state, context, vec![event]).await
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn ingest_batch(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Json(events): Json<Vec<RawLogEvent>>,
) -> Result<IngestResponse, ApiError> {
    if events.is_empty() {
        return Err(ApiError::BadRequest("batch must contain at least one event".to_string()));
    }
    if events.len() > state.settings.ingest_batch_max_items {
        return Err(ApiError::BadRequest(format!(
            "batch of {} events exceeds the maximum of {}",
            events.len(),
            state.settings.ingest_batch_max_items
        )));
    }
    ingest_batch_inner(state, context, events).await
}

async fn ingest_batch_inner(
    state: AppState,
    context: CredentialContext,
    events: Vec<RawLogEvent>,
) -> Result<IngestResponse, ApiError> {
    let depth = state
        .queue
        .depth(&context.project_id)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    if depth.depth >= state.settings.queue_depth_ceiling {
        return Err(ApiError::QueueFull {
            retry_after_secs: state.settings.queue_full_retry_after_secs,
        });
    }

    let mut accepted = 0usize;
    let mut errors = Vec::new();
    let now = Utc::now();

    for (index, raw) in events.into_iter().enumerate() {
        let mut event = match raw.validate(&context.project_id) {
            Ok(event) => event,
            Err(validation_error) => {
                errors.push(RejectedItem { index, reason: validation_error.to_string() });
                continue;
            }
        };
        event.enrich(now);

        let notification = event.level.is_notifiable().then(|| ErrorNotification {
            project_id: context.project_id.clone(),
            fingerprint: event.error_fingerprint.clone(),
            error_type: event.error_type.clone(),
            error_message: event.error_message.clone(),
            timestamp: event.timestamp,
        });

        let item = QueueItem::new(event, now);
        match state.queue.enqueue(&context.project_id, &item).await {
            Ok(()) => {
                accepted += 1;
                if let Some(notification) = notification {
                    publish_fire_and_forget(&state, notification).await;
                }
            }
            Err(CacheError::QueueFull) => {
                // Advisory check passed but the ceiling was crossed by a
                // concurrent enqueue; this item and the rest are rejected,
                // never silently dropped.
                errors.push(RejectedItem { index, reason: "per-project queue is now at its depth ceiling".to_string() });
            }
            Err(err) => {
                errors.push(RejectedItem { index, reason: format!("enqueue failed: {err}") });
            }
        }
    }

    Ok(IngestResponse { accepted, rejected: errors.len(), errors })
}

/// Publish is best-effort: a notification-bus failure must never fail
/// the ingest response, per spec.md §4.3 step 5.
async fn publish_fire_and_forget(state: &AppState, notification: ErrorNotification) {
    if let Err(err) = state.notification_bus.publish(&notification).await {
        warn!(error = %err, "notification publish failed, ingest still succeeds");
    }
}
