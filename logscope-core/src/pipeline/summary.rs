use crate::pipeline::aggregation::{DerivedStats, ServiceSummary};
use crate::pipeline::constants::MAX_FAILURE_SAMPLES;
use crate::pipeline::histogram::ServiceHistogram;
use crate::pipeline::top_n::TopNEntry;
use crate::pipeline::types::{FailureReason, ParseFailure};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The source reported end of input.
    Exhausted,
    Cancelled,
    IdleTimeout,
    /// The source failed; the summary covers what was read before.
    SourceError,
}

/// Run-level counters for lines that never reach the collectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunDiagnostics {
    pub lines_read: u64,
    pub skipped_lines: u64,
    pub parse_failures: u64,
    pub failures_by_reason: BTreeMap<FailureReason, u64>,
    pub filtered_out: u64,
    pub admitted: u64,
    pub delimiter: Option<String>,
    /// The first few failures, for troubleshooting.
    pub failure_samples: Vec<ParseFailure>,
}

impl RunDiagnostics {
    pub(crate) fn record_failure(&mut self, failure: ParseFailure) {
        self.parse_failures += 1;
        *self.failures_by_reason.entry(failure.reason).or_insert(0) += 1;
        if self.failure_samples.len() < MAX_FAILURE_SAMPLES {
            self.failure_samples.push(failure);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlowEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub latency_ms: f64,
}

impl From<&TopNEntry> for SlowEvent {
    fn from(entry: &TopNEntry) -> Self {
        Self {
            timestamp: entry.event.timestamp,
            event_type: entry.event.event_type.clone(),
            latency_ms: entry.event.latency_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceTopN {
    pub service: String,
    pub entries: Vec<SlowEvent>,
}

/// Everything a report sink needs about one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_events: u64,
    pub parse_failures: u64,
    pub overall: DerivedStats,
    pub per_service: Vec<ServiceSummary>,
    pub top_slowest: Vec<ServiceTopN>,
    pub histogram: Vec<ServiceHistogram>,
    pub diagnostics: RunDiagnostics,
    pub termination: Termination,
}
