use chrono::{Duration, Utc};
use logflux_models::{LogLevel, LogVolumePoint};
use tracing::{info, instrument, warn};

use crate::jobs::JobDeps;
use crate::project_directory;
use crate::scan::scan_window;

const CACHE_KIND: &str = "log_volume";

#[instrument(skip(deps))]
pub async fn run_once(deps: &JobDeps) {
    let settings = &deps.settings;
    let now = Utc::now() - Duration::seconds(settings.lag_secs);
    let window_start = now - Duration::hours(settings.log_volume_window_hours);
    let bucket_width = Duration::minutes(settings.log_volume_bucket_minutes);
    let ttl = settings.log_volume_cadence_secs * settings.cache_ttl_cadence_multiple;

    let project_ids = match project_directory::list(&deps.db).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "log_volume job failed to list projects");
            return;
        }
    };

    for project_id in project_ids {
        let events = match scan_window(&deps.logs, &project_id, window_start, now, settings.scan_page_size).await {
            Ok(events) => events,
            Err(err) => {
                warn!(project_id, error = %err, "log_volume scan failed");
                continue;
            }
        };

        let bucket_count = ((now - window_start).num_seconds() / bucket_width.num_seconds()).max(1);
        let mut points: Vec<LogVolumePoint> = (0..bucket_count)
            .map(|i| LogVolumePoint {
                timestamp: window_start + bucket_width * i as i32,
                debug: 0,
                info: 0,
                warning: 0,
                error: 0,
                critical: 0,
            })
            .collect();

        for event in events {
            let offset = (event.timestamp - window_start).num_seconds() / bucket_width.num_seconds();
            let Some(point) = offset.try_into().ok().and_then(|i: usize| points.get_mut(i)) else {
                continue;
            };
            match event.level {
                LogLevel::Debug => point.debug += 1,
                LogLevel::Info => point.info += 1,
                LogLevel::Warning => point.warning += 1,
                LogLevel::Error => point.error += 1,
                LogLevel::Critical => point.critical += 1,
            }
        }

        if let Err(err) = deps.metrics_cache.replace(&project_id, CACHE_KIND, &points, ttl).await {
            warn!(project_id, error = %err, "log_volume cache write failed");
        }
    }

    info!("log_volume job tick complete");
}
