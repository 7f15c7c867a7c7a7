use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Stable monthly partition name for `timestamp`, e.g. `logs_2025_11`.
/// Identical scheme applies to `ingestion_metrics_YYYY_MM`; callers supply
/// their own table prefix.
pub fn partition_name(prefix: &str, timestamp: DateTime<Utc>) -> String {
    format!("{prefix}_{:04}_{:02}", timestamp.year(), timestamp.month())
}

/// Half-open `[start, end)` range covering the calendar month containing
/// `timestamp`, in UTC.
pub fn partition_range(timestamp: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(timestamp.year(), timestamp.month(), 1, 0, 0, 0)
        .single()
        .expect("first-of-month is always a valid instant");

    let (next_year, next_month) = if timestamp.month() == 12 {
        (timestamp.year() + 1, 1)
    } else {
        (timestamp.year(), timestamp.month() + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .expect("first-of-next-month is always a valid instant");

    (start, end)
}

/// Every monthly partition name whose range overlaps `[start, end)`,
/// inclusive of partial overlap at either boundary. Used by the query
/// layer to prune to exactly the partitions a time-bounded query can
/// touch.
pub fn partitions_overlapping(prefix: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<String> {
    if end <= start {
        return Vec::new();
    }

    let mut names = Vec::new();
    let mut cursor = Utc
        .with_ymd_and_hms(start.year(), start.month(), 1, 0, 0, 0)
        .single()
        .expect("valid instant");

    while cursor < end {
        names.push(partition_name(prefix, cursor));
        let (next_year, next_month) = if cursor.month() == 12 {
            (cursor.year() + 1, 1)
        } else {
            (cursor.year(), cursor.month() + 1)
        };
        cursor = Utc
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()
            .expect("valid instant");
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn single_month_query_touches_one_partition() {
        let start = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap();
        assert_eq!(partitions_overlapping("logs", start, end), vec!["logs_2025_11"]);
    }

    #[test]
    fn spanning_range_touches_each_partition_once() {
        let start = Utc.with_ymd_and_hms(2025, 10, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 12, 2, 0, 0, 0).unwrap();
        assert_eq!(
            partitions_overlapping("logs", start, end),
            vec!["logs_2025_10", "logs_2025_11", "logs_2025_12"]
        );
    }

    #[test]
    fn december_rolls_into_next_year() {
        let t = Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap();
        assert_eq!(partition_name("logs", t), "logs_2025_12");
        let (_, end) = partition_range(t);
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }
}
