use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact, fire-and-forget notification published by the ingest front
/// when an `error`/`critical` event is accepted, and fanned out to SSE
/// subscribers of the owning project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorNotification {
    pub project_id: String,
    pub fingerprint: Option<String>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorNotification {
    /// Stable naming for the notification-bus channel this event belongs
    /// on: `notifications:errors:{project_id}`, scoped per project so a
    /// subscriber only ever sees its own project's errors.
    pub fn channel_name(project_id: &str) -> String {
        format!("notifications:errors:{project_id}")
    }
}
