use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use logflux_models::{ErrorGroupStatus, ErrorRatePoint, LogVolumePoint, MetricType, TopErrorView, UsageStatsDay};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::ApiError;
use crate::state::{AppState, CredentialContext};

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Bucket width in whole minutes; informational only — the
    /// pre-aggregator already fixed the bucket at write time.
    pub interval_minutes: Option<u32>,
}

fn within_window(timestamp: DateTime<Utc>, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    start.map_or(true, |s| timestamp >= s) && end.map_or(true, |e| timestamp < e)
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn error_rate(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<ErrorRatePoint>>, ApiError> {
    let points: Vec<ErrorRatePoint> = state
        .metrics_cache
        .fetch(&context.project_id, "error_rate")
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .unwrap_or_default();

    Ok(Json(
        points.into_iter().filter(|p| within_window(p.timestamp, params.start, params.end)).collect(),
    ))
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn log_volume(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<WindowParams>,
) -> Result<Json<Vec<LogVolumePoint>>, ApiError> {
    let points: Vec<LogVolumePoint> = state
        .metrics_cache
        .fetch(&context.project_id, "log_volume")
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .unwrap_or_default();

    Ok(Json(
        points.into_iter().filter(|p| within_window(p.timestamp, params.start, params.end)).collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct TopErrorsParams {
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

fn parse_status(raw: &str) -> Option<ErrorGroupStatus> {
    match raw {
        "unresolved" => Some(ErrorGroupStatus::Unresolved),
        "resolved" => Some(ErrorGroupStatus::Resolved),
        "ignored" => Some(ErrorGroupStatus::Ignored),
        "muted" => Some(ErrorGroupStatus::Muted),
        _ => None,
    }
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn top_errors(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<TopErrorsParams>,
) -> Result<Json<Vec<TopErrorView>>, ApiError> {
    let mut views: Vec<TopErrorView> = state
        .metrics_cache
        .fetch(&context.project_id, "top_errors")
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .unwrap_or_default();

    if let Some(status) = params.status.as_deref() {
        let wanted = parse_status(status).ok_or_else(|| ApiError::BadRequest(format!("unrecognized status '{status}'")))?;
        views.retain(|v| v.status == wanted);
    }
    views.retain(|v| within_window(v.last_seen, params.start, params.end) || within_window(v.first_seen, params.start, params.end));

    let limit = params.limit.unwrap_or(50) as usize;
    views.truncate(limit);
    Ok(Json(views))
}

#[derive(Debug, Deserialize)]
pub struct UsageStatsParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn usage_stats(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<UsageStatsParams>,
) -> Result<Json<Vec<UsageStatsDay>>, ApiError> {
    if params.end_date < params.start_date {
        return Err(ApiError::BadRequest("end_date must not precede start_date".to_string()));
    }
    let days: Vec<UsageStatsDay> = state
        .metrics_cache
        .fetch(&context.project_id, "usage_stats")
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .unwrap_or_default();

    Ok(Json(
        days.into_iter()
            .filter(|d| {
                NaiveDate::parse_from_str(&d.date, "%Y-%m-%d")
                    .map(|date| date >= params.start_date && date <= params.end_date)
                    .unwrap_or(false)
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AggregatedMetricsParams {
    pub metric_type: String,
    pub period_from: NaiveDate,
    pub period_to: NaiveDate,
}

fn parse_metric_type(raw: &str) -> Option<MetricType> {
    match raw {
        "exception" => Some(MetricType::Exception),
        "endpoint" => Some(MetricType::Endpoint),
        "log_volume" => Some(MetricType::LogVolume),
        _ => None,
    }
}

fn date_to_yyyymmdd(date: NaiveDate) -> u32 {
    use chrono::Datelike;
    (date.year() as u32) * 10_000 + date.month() * 100 + date.day()
}

#[instrument(skip_all, fields(project_id = %context.project_id))]
pub async fn aggregated_metrics(
    State(state): State<AppState>,
    Extension(context): Extension<CredentialContext>,
    Query(params): Query<AggregatedMetricsParams>,
) -> Result<Json<Vec<logflux_models::AggregatedMetric>>, ApiError> {
    let metric_type = parse_metric_type(&params.metric_type)
        .ok_or_else(|| ApiError::BadRequest(format!("unrecognized metric_type '{}'", params.metric_type)))?;
    if params.period_to < params.period_from {
        return Err(ApiError::BadRequest("period_to must not precede period_from".to_string()));
    }

    let rows = state
        .aggregated_metrics
        .query_range(
            &context.project_id,
            metric_type,
            date_to_yyyymmdd(params.period_from),
            date_to_yyyymmdd(params.period_to),
        )
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(rows))
}
