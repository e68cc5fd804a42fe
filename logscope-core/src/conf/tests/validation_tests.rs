use crate::conf::types::{
    AlertsSpec, AnalyzerSpec, FilterBlockSpec, HistogramSpec, InputSpec, StreamSpec,
};
use crate::conf::{parse_delimiter, validate};
use crate::pipeline::{AlertCadence, DelimiterPolicy, RunMode};

use pretty_assertions::assert_eq;
use std::time::Duration;

fn fields(spec: &AnalyzerSpec) -> Vec<String> {
    validate(spec, false)
        .unwrap_err()
        .errors
        .into_iter()
        .map(|issue| issue.field)
        .collect()
}

#[test]
fn delimiter_names_and_literals() {
    assert_eq!(parse_delimiter("auto"), Some(DelimiterPolicy::Auto));
    assert_eq!(parse_delimiter("comma"), Some(DelimiterPolicy::Fixed(',')));
    assert_eq!(parse_delimiter("tab"), Some(DelimiterPolicy::Fixed('\t')));
    assert_eq!(parse_delimiter("\\t"), Some(DelimiterPolicy::Fixed('\t')));
    assert_eq!(parse_delimiter("\t"), Some(DelimiterPolicy::Fixed('\t')));
    assert_eq!(parse_delimiter("pipe"), Some(DelimiterPolicy::Fixed('|')));
    assert_eq!(parse_delimiter(";"), Some(DelimiterPolicy::Fixed(';')));
    assert_eq!(parse_delimiter("x"), None);
    assert_eq!(parse_delimiter(",,"), None);
    assert_eq!(parse_delimiter(""), None);
}

#[test]
fn invalid_delimiter_is_reported() {
    // Arrange
    let spec = AnalyzerSpec {
        input: InputSpec {
            delimiter: Some("semicolon".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(fields, vec!["input.delimiter"]);
}

#[test]
fn blank_error_label_is_reported() {
    // Arrange
    let spec = AnalyzerSpec {
        input: InputSpec {
            error_label: Some("  ".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(fields, vec!["input.error_label"]);
}

#[test]
fn filter_problems_are_collected_together() {
    // Arrange
    let spec = AnalyzerSpec {
        filter: FilterBlockSpec {
            event_type: Some("".to_string()),
            services: Some(vec![" ".to_string()]),
            since: Some("yesterday".to_string()),
            until: None,
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(
        fields,
        vec!["filter.event_type", "filter.services", "filter.since"]
    );
}

#[test]
fn window_must_not_be_empty() {
    // Arrange
    let spec = AnalyzerSpec {
        filter: FilterBlockSpec {
            since: Some("2024-01-02T00:00:00Z".to_string()),
            until: Some("2024-01-02T00:00:00Z".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(fields, vec!["filter.until"]);
}

#[test]
fn negative_and_nan_thresholds_are_rejected() {
    // Arrange
    let spec = AnalyzerSpec {
        alerts: AlertsSpec {
            error_rate_percent: Some(f64::NAN),
            latency_ms: Some(-5.0),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(fields, vec!["alerts.error_rate_percent", "alerts.latency_ms"]);
}

#[test]
fn zero_threshold_is_allowed() {
    // Arrange
    let spec = AnalyzerSpec {
        alerts: AlertsSpec {
            error_rate_percent: Some(0.0),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let config = validate(&spec, false).unwrap();

    // Assert
    assert_eq!(config.thresholds.error_rate_percent, 0.0);
}

#[test]
fn cadence_requires_its_setting() {
    // Arrange
    let spec = AnalyzerSpec {
        alerts: AlertsSpec {
            cadence: Some("interval".to_string()),
            interval_ms: Some(0),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(fields, vec!["alerts.interval_ms"]);
}

#[test]
fn cadence_inferred_from_interval() {
    // Arrange
    let spec = AnalyzerSpec {
        alerts: AlertsSpec {
            interval_ms: Some(2000),
            ..Default::default()
        },
        ..Default::default()
    };

    // Act
    let config = validate(&spec, true).unwrap();

    // Assert
    assert_eq!(
        config.alert_cadence,
        AlertCadence::Interval(Duration::from_secs(2))
    );
}

#[test]
fn boundaries_must_be_finite_and_ascending() {
    // Arrange
    let spec = AnalyzerSpec {
        histogram: HistogramSpec {
            boundaries: Some(vec![0.0, 10.0, 10.0, f64::INFINITY]),
        },
        ..Default::default()
    };

    // Act
    let report = validate(&spec, false).unwrap_err();

    // Assert
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.field == "histogram.boundaries"));
    assert!(report.errors[0].message.contains("finite"));
    assert!(report.errors[1].message.contains("10 follows 10"));
}

#[test]
fn empty_boundaries_are_rejected() {
    // Arrange
    let spec = AnalyzerSpec {
        histogram: HistogramSpec {
            boundaries: Some(vec![]),
        },
        ..Default::default()
    };

    // Act
    let fields = fields(&spec);

    // Assert
    assert_eq!(fields, vec!["histogram.boundaries"]);
}

#[test]
fn zero_idle_timeout_disables_it() {
    // Arrange
    let spec = AnalyzerSpec {
        stream: StreamSpec {
            idle_timeout_ms: Some(0),
        },
        ..Default::default()
    };

    // Act
    let streaming = validate(&spec, true).unwrap();
    let finite = validate(&spec, false).unwrap();

    // Assert
    assert_eq!(streaming.mode, RunMode::Streaming { idle_timeout: None });
    assert_eq!(finite.mode, RunMode::Finite);
}

#[test]
fn report_renders_plain_and_json() {
    // Arrange
    let spec = AnalyzerSpec {
        input: InputSpec {
            delimiter: Some("nope".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let report = validate(&spec, false).unwrap_err();

    // Act
    let plain = report.render_plain();
    let json: serde_json::Value = serde_json::from_str(&report.render_json()).unwrap();

    // Assert
    assert!(plain.starts_with("input.delimiter: error: invalid delimiter: \"nope\"\n"));
    assert!(plain.contains("  help: "));
    assert_eq!(json["errors"][0]["field"], "input.delimiter");
}
