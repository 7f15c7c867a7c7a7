use chrono::{Duration, Utc};
use logflux_models::TopErrorView;
use tracing::{info, instrument, warn};

use crate::jobs::JobDeps;
use crate::project_directory;

const CACHE_KIND: &str = "top_errors";

/// `error_groups` is a lifetime aggregate, not a windowed one — this job
/// narrows it to the window by keeping only groups whose `last_seen` falls
/// inside `[now - window, now - lag]`, then truncates to the configured
/// limit by `occurrence_count`. Fetching a wider pool than the final limit
/// before filtering keeps the result close to "top N within the window"
/// even though the underlying store only orders by all-time count.
#[instrument(skip(deps))]
pub async fn run_once(deps: &JobDeps) {
    let settings = &deps.settings;
    let now = Utc::now() - Duration::seconds(settings.lag_secs);
    let window_start = now - Duration::hours(settings.top_errors_window_hours);
    let ttl = settings.top_errors_cadence_secs * settings.cache_ttl_cadence_multiple;
    let fetch_pool = settings.top_errors_limit.saturating_mul(4).max(200);

    let project_ids = match project_directory::list(&deps.db).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "top_errors job failed to list projects");
            return;
        }
    };

    for project_id in project_ids {
        let groups = match deps.error_groups.top_errors(&project_id, fetch_pool, None).await {
            Ok(groups) => groups,
            Err(err) => {
                warn!(project_id, error = %err, "top_errors fetch failed");
                continue;
            }
        };

        let mut views: Vec<TopErrorView> = groups
            .into_iter()
            .filter(|g| g.last_seen >= window_start && g.last_seen < now)
            .map(|g| TopErrorView {
                fingerprint: g.fingerprint,
                error_type: g.error_type,
                error_message: g.error_message,
                occurrence_count: g.occurrence_count,
                first_seen: g.first_seen,
                last_seen: g.last_seen,
                sample_log_id: g.sample_log_id,
                status: g.status,
            })
            .collect();
        views.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
        views.truncate(settings.top_errors_limit as usize);

        if let Err(err) = deps.metrics_cache.replace(&project_id, CACHE_KIND, &views, ttl).await {
            warn!(project_id, error = %err, "top_errors cache write failed");
        }
    }

    info!("top_errors job tick complete");
}
