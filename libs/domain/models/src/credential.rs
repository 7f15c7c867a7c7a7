use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache entry resolved from the external Auth collaborator and keyed by a
/// non-reversible digest of the presented credential (never the plaintext).
///
/// `account_id` and the two rate-limit fields are `Option` because the
/// Auth collaborator exposes two slightly different response shapes
/// depending on credential type; callers treat missing fields as optional
/// rather than guessing which shape is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub project_id: String,
    pub account_id: Option<String>,
    pub daily_quota: u64,
    pub retention_days: u32,
    pub rate_limit_per_minute: Option<u32>,
    pub rate_limit_per_hour: Option<u32>,
    pub issued_at: DateTime<Utc>,
}
