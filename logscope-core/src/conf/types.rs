use crate::pipeline::AlertScope;
use serde::{Deserialize, Serialize};

/// Analyzer settings as written in `logscope.hcl`, before validation.
///
/// Every field is optional; anything left out falls back to the built-in
/// defaults when the spec is validated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerSpec {
    #[serde(default)]
    pub input: InputSpec,

    #[serde(default)]
    pub filter: FilterBlockSpec,

    #[serde(default)]
    pub alerts: AlertsSpec,

    #[serde(default)]
    pub histogram: HistogramSpec,

    pub top_n: Option<usize>,

    #[serde(default)]
    pub stream: StreamSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// `auto`, a single character, or one of `comma`, `tab`, `pipe`.
    pub delimiter: Option<String>,

    /// Event type counted as an error (exact match).
    pub error_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterBlockSpec {
    pub event_type: Option<String>,
    pub services: Option<Vec<String>>,

    /// Inclusive lower bound.
    pub since: Option<String>,

    /// Exclusive upper bound.
    pub until: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlertsSpec {
    pub error_rate_percent: Option<f64>,
    pub latency_ms: Option<f64>,
    pub scope: Option<AlertScope>,

    /// `end_of_run`, `every_event`, `every_events` or `interval`.
    pub cadence: Option<String>,
    pub every_events: Option<u64>,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramSpec {
    pub boundaries: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamSpec {
    /// 0 disables the timeout.
    pub idle_timeout_ms: Option<u64>,
}
