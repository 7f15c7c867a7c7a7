use chrono::{Duration, Utc};
use logflux_models::{ErrorRatePoint, LogLevel};
use tracing::{info, instrument, warn};

use crate::jobs::JobDeps;
use crate::project_directory;
use crate::scan::scan_window;

const CACHE_KIND: &str = "error_rate";

#[instrument(skip(deps))]
pub async fn run_once(deps: &JobDeps) {
    let settings = &deps.settings;
    let now = Utc::now() - Duration::seconds(settings.lag_secs);
    let window_start = now - Duration::hours(settings.error_rate_window_hours);
    let bucket_width = Duration::minutes(settings.error_rate_bucket_minutes);
    let ttl = settings.error_rate_cadence_secs * settings.cache_ttl_cadence_multiple;

    let project_ids = match project_directory::list(&deps.db).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "error_rate job failed to list projects");
            return;
        }
    };

    for project_id in project_ids {
        let events = match scan_window(&deps.logs, &project_id, window_start, now, settings.scan_page_size).await {
            Ok(events) => events,
            Err(err) => {
                warn!(project_id, error = %err, "error_rate scan failed");
                continue;
            }
        };

        let bucket_count = ((now - window_start).num_seconds() / bucket_width.num_seconds()).max(1);
        let mut points: Vec<ErrorRatePoint> = (0..bucket_count)
            .map(|i| ErrorRatePoint {
                timestamp: window_start + bucket_width * i as i32,
                error_count: 0,
                critical_count: 0,
            })
            .collect();

        for event in events {
            if !matches!(event.level, LogLevel::Error | LogLevel::Critical) {
                continue;
            }
            let offset = (event.timestamp - window_start).num_seconds() / bucket_width.num_seconds();
            let Some(point) = offset.try_into().ok().and_then(|i: usize| points.get_mut(i)) else {
                continue;
            };
            point.error_count += 1;
            if event.level == LogLevel::Critical {
                point.critical_count += 1;
            }
        }

        if let Err(err) = deps.metrics_cache.replace(&project_id, CACHE_KIND, &points, ttl).await {
            warn!(project_id, error = %err, "error_rate cache write failed");
        }
    }

    info!("error_rate job tick complete");
}
