use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

/// One well-formed log line.
///
/// The trimmed source text of the timestamp and latency fields is kept so the
/// original four fields can be handed back unchanged (see [`LogEvent::fields`]).
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub event_type: String,
    pub latency_ms: f64,
    raw_timestamp: String,
    raw_latency: String,
}

impl LogEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        service: impl Into<String>,
        event_type: impl Into<String>,
        latency_ms: f64,
    ) -> Self {
        Self {
            raw_timestamp: timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            raw_latency: latency_ms.to_string(),
            timestamp,
            service: service.into(),
            event_type: event_type.into(),
            latency_ms,
        }
    }

    pub(crate) fn from_parts(
        timestamp: DateTime<Utc>,
        raw_timestamp: &str,
        service: &str,
        event_type: &str,
        latency_ms: f64,
        raw_latency: &str,
    ) -> Self {
        Self {
            timestamp,
            service: service.to_string(),
            event_type: event_type.to_string(),
            latency_ms,
            raw_timestamp: raw_timestamp.to_string(),
            raw_latency: raw_latency.to_string(),
        }
    }

    /// The four fields in line order, as they appeared in the source (trimmed).
    pub fn fields(&self) -> [&str; 4] {
        [
            &self.raw_timestamp,
            &self.service,
            &self.event_type,
            &self.raw_latency,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    FieldCount,
    BadLatency,
    BadTimestamp,
    EmptyField,
    FormatDetection,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::FieldCount => "field_count",
            FailureReason::BadLatency => "bad_latency",
            FailureReason::BadTimestamp => "bad_timestamp",
            FailureReason::EmptyField => "empty_field",
            FailureReason::FormatDetection => "format_detection",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line that could not be turned into a [`LogEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub line: String,
    pub reason: FailureReason,
}

impl ParseFailure {
    pub fn new(line: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            line: line.into(),
            reason,
        }
    }
}
