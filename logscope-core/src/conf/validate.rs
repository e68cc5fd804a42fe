use crate::conf::report::ValidationReport;
use crate::conf::types::{AlertsSpec, AnalyzerSpec, FilterBlockSpec, HistogramSpec};
use crate::pipeline::{
    AlertCadence, AlertThresholds, DEFAULT_ERROR_LABEL, DEFAULT_LATENCY_BUCKETS_MS, DEFAULT_TOP_N,
    DelimiterPolicy, FilterSpec, PipelineConfig, RunMode, TimeWindow, parse_timestamp,
};
use chrono::{DateTime, Utc};
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;

pub fn parse_delimiter(value: &str) -> Option<DelimiterPolicy> {
    let fixed = match value {
        "auto" => return Some(DelimiterPolicy::Auto),
        "comma" => ',',
        "tab" | "\\t" => '\t',
        "pipe" => '|',
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_alphanumeric() && c != '\n' && c != '\r' => c,
                _ => return None,
            }
        }
    };
    Some(DelimiterPolicy::Fixed(fixed))
}

fn validate_timestamp(
    field: &str,
    value: Option<&str>,
    report: &mut ValidationReport,
) -> Option<DateTime<Utc>> {
    let raw = value?;
    let parsed = parse_timestamp(raw.trim());
    if parsed.is_none() {
        report.invalid_timestamp(field, raw);
    }
    parsed
}

fn validate_filter(spec: &FilterBlockSpec, report: &mut ValidationReport) -> FilterSpec {
    let event_type = spec.event_type.as_deref().map(str::trim);
    if event_type == Some("") {
        report.empty_event_type();
    }

    let services = spec.services.as_ref().map(|names| {
        names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect::<std::collections::BTreeSet<_>>()
    });
    if services.as_ref().is_some_and(|s| s.is_empty()) {
        report.empty_service_filter();
    }

    let start = validate_timestamp("filter.since", spec.since.as_deref(), report);
    let end = validate_timestamp("filter.until", spec.until.as_deref(), report);
    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            report.empty_time_window(&s.to_rfc3339(), &e.to_rfc3339());
        }
    }

    FilterSpec {
        event_type: event_type.filter(|t| !t.is_empty()).map(str::to_string),
        services,
        window: TimeWindow { start, end },
    }
}

fn validate_threshold(
    field: &str,
    value: Option<f64>,
    fallback: f64,
    report: &mut ValidationReport,
) -> f64 {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            report.invalid_threshold(field, v);
            fallback
        }
        Some(v) => v,
        None => fallback,
    }
}

fn validate_alerts(
    spec: &AlertsSpec,
    report: &mut ValidationReport,
) -> (AlertThresholds, AlertCadence) {
    let defaults = AlertThresholds::default();
    let thresholds = AlertThresholds {
        error_rate_percent: validate_threshold(
            "alerts.error_rate_percent",
            spec.error_rate_percent,
            defaults.error_rate_percent,
            report,
        ),
        latency_ms: validate_threshold(
            "alerts.latency_ms",
            spec.latency_ms,
            defaults.latency_ms,
            report,
        ),
        scope: spec.scope.unwrap_or(defaults.scope),
    };

    let every_events = spec.every_events.and_then(NonZeroU64::new);
    let interval = spec
        .interval_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);

    let cadence = match spec.cadence.as_deref() {
        None => match (every_events, interval) {
            (Some(n), _) => AlertCadence::EveryEvents(n),
            (None, Some(d)) => AlertCadence::Interval(d),
            (None, None) => AlertCadence::EndOfRun,
        },
        Some("end_of_run") => AlertCadence::EndOfRun,
        Some("every_event") => AlertCadence::EveryEvent,
        Some("every_events") => match every_events {
            Some(n) => AlertCadence::EveryEvents(n),
            None => {
                report.missing_cadence_setting("every_events", "alerts.every_events");
                AlertCadence::EndOfRun
            }
        },
        Some("interval") => match interval {
            Some(d) => AlertCadence::Interval(d),
            None => {
                report.missing_cadence_setting("interval", "alerts.interval_ms");
                AlertCadence::EndOfRun
            }
        },
        Some(other) => {
            report.invalid_cadence(other);
            AlertCadence::EndOfRun
        }
    };

    (thresholds, cadence)
}

fn validate_histogram(spec: &HistogramSpec, report: &mut ValidationReport) -> Arc<[f64]> {
    let Some(boundaries) = &spec.boundaries else {
        return Arc::from(DEFAULT_LATENCY_BUCKETS_MS);
    };

    if boundaries.is_empty() {
        report.empty_boundaries();
    }

    for b in boundaries.iter().filter(|b| !b.is_finite()) {
        report.non_finite_boundary(*b);
    }

    for pair in boundaries.windows(2) {
        if pair[1] <= pair[0] {
            report.unsorted_boundaries(pair[0], pair[1]);
        }
    }

    Arc::from(boundaries.as_slice())
}

/// Resolves a raw spec into a runnable [`PipelineConfig`]. Every problem is
/// collected before returning.
pub fn validate(spec: &AnalyzerSpec, streaming: bool) -> Result<PipelineConfig, ValidationReport> {
    let mut report = ValidationReport::default();

    let delimiter = match spec.input.delimiter.as_deref() {
        None => DelimiterPolicy::Auto,
        Some(raw) => parse_delimiter(raw).unwrap_or_else(|| {
            report.invalid_delimiter(raw);
            DelimiterPolicy::Auto
        }),
    };

    let error_label = spec
        .input
        .error_label
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_ERROR_LABEL)
        .to_string();
    if error_label.is_empty() {
        report.empty_error_label();
    }

    let filter = validate_filter(&spec.filter, &mut report);
    let (thresholds, alert_cadence) = validate_alerts(&spec.alerts, &mut report);
    let histogram_boundaries = validate_histogram(&spec.histogram, &mut report);

    let mode = if streaming {
        RunMode::Streaming {
            idle_timeout: spec
                .stream
                .idle_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
        }
    } else {
        RunMode::Finite
    };

    if report.has_violations() {
        return Err(report);
    }

    Ok(PipelineConfig {
        delimiter,
        error_label,
        filter,
        thresholds,
        histogram_boundaries,
        top_n: spec.top_n.unwrap_or(DEFAULT_TOP_N),
        mode,
        alert_cadence,
    })
}
