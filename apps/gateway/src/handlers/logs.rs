use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use logflux_db::{LogQuery, LogQueryPage};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::ApiError;
use crate::state::{AppState, CredentialContext};

#[derive(Debug, Deserialize)]
pub struct LogQueryParams {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub level: Option<String>,
    pub log_type: Option<String>,
    pub environment: Option<String>,
    pub error_fingerprint: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LogQueryParams {
    /// A query without a time range defaults to the last
    /// `default_query_window_hours` rather than scanning every partition.
    fn into_repo_query(self, default_window_hours: i64) -> LogQuery {
        let end_time = self.end_time.unwrap_or_else(Utc::now);
        let start_time = self
            .start_time
            .unwrap_or_else(|| end_time - chrono::Duration::hours(default_window_hours));

        LogQuery {
            start_time,
            end_time,
            level: self.level,
            log_type: self.log_type,
            environment: self.environment,
            error_fingerprint: self.error_fingerprint,
            limit: self.limit.unwrap_or(logflux_db::DEFAULT_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQueryParams {
    pub q: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[instrument(skip_all, fields(project_id = %context.project_id, log_id))]
pub async fn get_log(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Path(log_id): Path<i64>,
) -> Result<Json<logflux_models::LogEvent>, ApiError> {
    let event = state
        .logs
        .get_log(&context.project_id, log_id)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn query_logs(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<LogQueryParams>,
) -> Result<Json<LogQueryPage>, ApiError> {
    let query = params.into_repo_query(state.settings.default_query_window_hours);
    if query.end_time <= query.start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }
    let page = state
        .logs
        .query_logs(&context.project_id, &query)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(page))
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn search_logs(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<LogQueryPage>, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::BadRequest("q must not be empty".to_string()));
    }
    let end_time = params.end_time.unwrap_or_else(Utc::now);
    let start_time = params
        .start_time
        .unwrap_or_else(|| end_time - chrono::Duration::hours(state.settings.default_query_window_hours));
    if end_time <= start_time {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    let query = LogQuery {
        start_time,
        end_time,
        level: None,
        log_type: None,
        environment: None,
        error_fingerprint: None,
        limit: params.limit.unwrap_or(logflux_db::DEFAULT_LIMIT),
        offset: params.offset.unwrap_or(0),
    };
    let page = state
        .logs
        .search_logs(&context.project_id, &params.q, &query)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(page))
}
