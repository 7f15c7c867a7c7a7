use chrono::{Duration, NaiveDate, Utc};
use logflux_models::UsageStatsDay;
use tracing::{info, instrument, warn};

use crate::jobs::JobDeps;
use crate::project_directory;
use crate::scan::count_window;

const CACHE_KIND: &str = "usage_stats";

/// Per-day `log_count` over the trailing `usage_stats_window_days`, paired
/// with a quota the worker itself has no way to look up (project CRUD is
/// an external collaborator) — it reports against `default_daily_quota`
/// instead, matching spec.md §9's note that quota is out of scope here.
#[instrument(skip(deps))]
pub async fn run_once(deps: &JobDeps) {
    let settings = &deps.settings;
    let now = Utc::now() - Duration::seconds(settings.lag_secs);
    let today = now.date_naive();
    let first_day = today - Duration::days(settings.usage_stats_window_days - 1);

    let project_ids = match project_directory::list(&deps.db).await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "usage_stats job failed to list projects");
            return;
        }
    };

    for project_id in project_ids {
        let mut days = Vec::new();
        let mut cursor = first_day;
        while cursor <= today {
            let day_start = cursor.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc();
            let day_end = (day_start + Duration::days(1)).min(now);

            let log_count = if day_end > day_start {
                match count_window(&deps.logs, &project_id, day_start, day_end).await {
                    Ok(count) => count,
                    Err(err) => {
                        warn!(project_id, error = %err, date = %cursor, "usage_stats day scan failed");
                        cursor += Duration::days(1);
                        continue;
                    }
                }
            } else {
                0
            };

            days.push(build_day(cursor, log_count, settings.default_daily_quota));
            cursor += Duration::days(1);
        }

        let ttl = settings.usage_stats_cadence_secs * settings.cache_ttl_cadence_multiple;
        if let Err(err) = deps.metrics_cache.replace(&project_id, CACHE_KIND, &days, ttl).await {
            warn!(project_id, error = %err, "usage_stats cache write failed");
        }
    }

    info!("usage_stats job tick complete");
}

fn build_day(date: NaiveDate, log_count: u64, daily_quota: u64) -> UsageStatsDay {
    let quota_used_percent = if daily_quota == 0 {
        0.0
    } else {
        (log_count as f64 / daily_quota as f64) * 100.0
    };
    UsageStatsDay {
        date: date.format("%Y-%m-%d").to_string(),
        log_count,
        daily_quota,
        quota_used_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_used_percent_is_a_ratio_of_count_to_quota() {
        let day = build_day(NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(), 250, 1000);
        assert_eq!(day.date, "2025-11-14");
        assert_eq!(day.quota_used_percent, 25.0);
    }

    #[test]
    fn zero_quota_never_divides_by_zero() {
        let day = build_day(NaiveDate::from_ymd_opt(2025, 11, 14).unwrap(), 10, 0);
        assert_eq!(day.quota_used_percent, 0.0);
    }
}
