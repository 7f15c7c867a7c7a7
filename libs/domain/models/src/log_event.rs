use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::fingerprint::compute_fingerprint;

pub const MAX_MESSAGE_BYTES: usize = 10 * 1024;
pub const MAX_ERROR_MESSAGE_BYTES: usize = 5 * 1024;
pub const MAX_STACK_TRACE_BYTES: usize = 50 * 1024;
pub const MAX_ATTRIBUTES_BYTES: usize = 100 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn is_notifiable(self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            "critical" => Some(LogLevel::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Console,
    Logger,
    Exception,
    Network,
    Database,
    Endpoint,
    Custom,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Console => "console",
            LogType::Logger => "logger",
            LogType::Exception => "exception",
            LogType::Network => "network",
            LogType::Database => "database",
            LogType::Endpoint => "endpoint",
            LogType::Custom => "custom",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "console" => Some(LogType::Console),
            "logger" => Some(LogType::Logger),
            "exception" => Some(LogType::Exception),
            "network" => Some(LogType::Network),
            "database" => Some(LogType::Database),
            "endpoint" => Some(LogType::Endpoint),
            "custom" => Some(LogType::Custom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Standard,
    High,
    Critical,
}

impl Importance {
    pub fn as_str(self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Standard => "standard",
            Importance::High => "high",
            Importance::Critical => "critical",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "low" => Some(Importance::Low),
            "standard" => Some(Importance::Standard),
            "high" => Some(Importance::High),
            "critical" => Some(Importance::Critical),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("project_id must not be empty")]
    EmptyProjectId,
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("timestamp '{0}' is not a parseable UTC instant")]
    BadTimestamp(String),
    #[error("level '{0}' is not one of debug|info|warning|error|critical")]
    BadLevel(String),
    #[error("log_type '{0}' is not a recognized enum value")]
    BadLogType(String),
    #[error("importance '{0}' is not a recognized enum value")]
    BadImportance(String),
    #[error("message exceeds {MAX_MESSAGE_BYTES} bytes")]
    MessageTooLarge,
    #[error("error_message exceeds {MAX_ERROR_MESSAGE_BYTES} bytes")]
    ErrorMessageTooLarge,
    #[error("stack_trace exceeds {MAX_STACK_TRACE_BYTES} bytes")]
    StackTraceTooLarge,
    #[error("attributes blob exceeds {MAX_ATTRIBUTES_BYTES} bytes")]
    AttributesTooLarge,
}

/// The as-received wire shape of a single ingest item. Field types mirror
/// client JSON exactly (enums arrive as strings so a bad value can be
/// reported with the offending string rather than a generic deserialize
/// failure).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLogEvent {
    pub timestamp: String,
    pub level: String,
    pub log_type: String,
    pub importance: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    pub message: String,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub sdk_version: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platform_version: Option<String>,
    #[serde(default)]
    pub processing_time_ms: Option<i64>,
}

/// A validated, not-yet-persisted log event. `id` and `ingested_at` are
/// filled in later by the storage worker / ingest enrichment step
/// respectively — never by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: Option<i64>,
    pub project_id: String,
    pub timestamp: DateTime<Utc>,
    pub ingested_at: Option<DateTime<Utc>>,
    pub level: LogLevel,
    pub log_type: LogType,
    pub importance: Importance,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub message: String,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub stack_trace: Option<String>,
    pub attributes: Option<Value>,
    pub sdk_version: Option<String>,
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub processing_time_ms: Option<i64>,
    pub error_fingerprint: Option<String>,
}

impl RawLogEvent {
    /// Validates and converts a wire event into a `LogEvent` scoped to
    /// `project_id`. Oversize fields are rejected, never truncated.
    pub fn validate(self, project_id: &str) -> Result<LogEvent, ValidationError> {
        if project_id.trim().is_empty() {
            return Err(ValidationError::EmptyProjectId);
        }
        if self.message.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if self.message.len() > MAX_MESSAGE_BYTES {
            return Err(ValidationError::MessageTooLarge);
        }

        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ValidationError::BadTimestamp(self.timestamp.clone()))?;

        let level =
            LogLevel::from_str(&self.level).ok_or_else(|| ValidationError::BadLevel(self.level.clone()))?;
        let log_type = LogType::from_str(&self.log_type)
            .ok_or_else(|| ValidationError::BadLogType(self.log_type.clone()))?;
        let importance = Importance::from_str(&self.importance)
            .ok_or_else(|| ValidationError::BadImportance(self.importance.clone()))?;

        if let Some(error_message) = &self.error_message {
            if error_message.len() > MAX_ERROR_MESSAGE_BYTES {
                return Err(ValidationError::ErrorMessageTooLarge);
            }
        }
        if let Some(stack_trace) = &self.stack_trace {
            if stack_trace.len() > MAX_STACK_TRACE_BYTES {
                return Err(ValidationError::StackTraceTooLarge);
            }
        }
        if let Some(attributes) = &self.attributes {
            let encoded_len = serde_json::to_vec(attributes).unwrap_or_default().len();
            if encoded_len > MAX_ATTRIBUTES_BYTES {
                return Err(ValidationError::AttributesTooLarge);
            }
        }

        Ok(LogEvent {
            id: None,
            project_id: project_id.to_string(),
            timestamp,
            ingested_at: None,
            level,
            log_type,
            importance,
            environment: self.environment,
            release: self.release,
            message: self.message,
            error_type: self.error_type,
            error_message: self.error_message,
            stack_trace: self.stack_trace,
            attributes: self.attributes,
            sdk_version: self.sdk_version,
            platform: self.platform,
            platform_version: self.platform_version,
            processing_time_ms: self.processing_time_ms,
            error_fingerprint: None,
        })
    }
}

impl LogEvent {
    /// Sets `ingested_at` and, iff `error_type` is present, computes the
    /// deterministic error fingerprint. Must run exactly once, at the
    /// ingest boundary, before the event is enqueued.
    pub fn enrich(&mut self, now: DateTime<Utc>) {
        self.ingested_at = Some(now);
        if let Some(error_type) = &self.error_type {
            self.error_fingerprint = Some(compute_fingerprint(
                error_type,
                self.stack_trace.as_deref().unwrap_or(""),
                self.platform.as_deref().unwrap_or(""),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawLogEvent {
        RawLogEvent {
            timestamp: "2025-11-14T10:00:00Z".to_string(),
            level: "info".to_string(),
            log_type: "console".to_string(),
            importance: "standard".to_string(),
            environment: None,
            release: None,
            message: "hello".to_string(),
            error_type: None,
            error_message: None,
            stack_trace: None,
            attributes: None,
            sdk_version: None,
            platform: None,
            platform_version: None,
            processing_time_ms: None,
        }
    }

    #[test]
    fn validates_a_minimal_event() {
        let event = sample().validate("proj_1").expect("should validate");
        assert_eq!(event.project_id, "proj_1");
        assert_eq!(event.level, LogLevel::Info);
        assert!(event.error_fingerprint.is_none());
    }

    #[test]
    fn rejects_bad_timestamp() {
        let mut raw = sample();
        raw.timestamp = "not-a-date".to_string();
        assert_eq!(
            raw.validate("proj_1").unwrap_err(),
            ValidationError::BadTimestamp("not-a-date".to_string())
        );
    }

    #[test]
    fn rejects_unknown_level_instead_of_truncating() {
        let mut raw = sample();
        raw.level = "verbose".to_string();
        assert_eq!(
            raw.validate("proj_1").unwrap_err(),
            ValidationError::BadLevel("verbose".to_string())
        );
    }

    #[test]
    fn rejects_oversize_message_rather_than_truncate() {
        let mut raw = sample();
        raw.message = "x".repeat(MAX_MESSAGE_BYTES + 1);
        assert_eq!(raw.validate("proj_1").unwrap_err(), ValidationError::MessageTooLarge);
    }

    #[test]
    fn fingerprint_is_present_iff_error_type_is() {
        let mut raw = sample();
        raw.error_type = Some("ValueError".to_string());
        let mut event = raw.validate("proj_1").unwrap();
        event.enrich(Utc::now());
        assert!(event.error_fingerprint.is_some());

        let mut event_without_error = sample().validate("proj_1").unwrap();
        event_without_error.enrich(Utc::now());
        assert!(event_without_error.error_fingerprint.is_none());
    }
}
