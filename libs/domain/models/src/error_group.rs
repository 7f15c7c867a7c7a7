use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorGroupStatus {
    Unresolved,
    Resolved,
    Ignored,
    Muted,
}

impl Default for ErrorGroupStatus {
    fn default() -> Self {
        ErrorGroupStatus::Unresolved
    }
}

/// Mutable aggregate, unique per `(project_id, fingerprint)`.
///
/// Invariants enforced by `logflux-db`'s upsert, not by this struct alone:
/// `first_seen <= last_seen`, `occurrence_count >= 1`, and `sample_*`
/// fields are write-once (set on first observation, never overwritten).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorGroup {
    pub project_id: String,
    pub fingerprint: String,
    pub error_type: String,
    pub error_message: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub occurrence_count: u64,
    pub status: ErrorGroupStatus,
    pub sample_log_id: Option<i64>,
    pub sample_stack_trace: Option<String>,
}

impl ErrorGroup {
    pub fn first_observation(
        project_id: &str,
        fingerprint: &str,
        error_type: &str,
        error_message: &str,
        observed_at: DateTime<Utc>,
        sample_log_id: Option<i64>,
        sample_stack_trace: Option<String>,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            fingerprint: fingerprint.to_string(),
            error_type: error_type.to_string(),
            error_message: error_message.to_string(),
            first_seen: observed_at,
            last_seen: observed_at,
            occurrence_count: 1,
            status: ErrorGroupStatus::Unresolved,
            sample_log_id,
            sample_stack_trace,
        }
    }

    /// Folds a new observation into an existing group. `sample_*` fields
    /// and `first_seen` never move backward/are never overwritten.
    pub fn record_occurrence(&mut self, observed_at: DateTime<Utc>) {
        self.occurrence_count += 1;
        if observed_at > self.last_seen {
            self.last_seen = observed_at;
        }
        if observed_at < self.first_seen {
            self.first_seen = observed_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monotonicity_holds_across_occurrences() {
        let t0 = Utc.with_ymd_and_hms(2025, 11, 14, 10, 0, 0).unwrap();
        let t1 = t0 + chrono::Duration::seconds(1);
        let t2 = t0 + chrono::Duration::seconds(2);

        let mut group =
            ErrorGroup::first_observation("proj_1", "fp", "ValueError", "bad value", t0, Some(1), None);
        group.record_occurrence(t1);
        group.record_occurrence(t2);

        assert_eq!(group.occurrence_count, 3);
        assert_eq!(group.first_seen, t0);
        assert_eq!(group.last_seen, t2);
    }

    #[test]
    fn out_of_order_observation_still_respects_bounds() {
        let t0 = Utc.with_ymd_and_hms(2025, 11, 14, 10, 0, 0).unwrap();
        let earlier = t0 - chrono::Duration::seconds(5);

        let mut group =
            ErrorGroup::first_observation("proj_1", "fp", "ValueError", "bad value", t0, Some(1), None);
        group.record_occurrence(earlier);

        assert_eq!(group.first_seen, earlier);
        assert_eq!(group.last_seen, t0);
        assert_eq!(group.occurrence_count, 2);
    }
}
