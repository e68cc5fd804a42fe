use integration_tests::harness::{fixture_path, run_with};
use logscope_core::conf::{ConfigError, load_config};
use logscope_core::pipeline::{AlertMetric, AlertTarget};
use pretty_assertions::assert_eq;

#[test]
fn valid_config_drives_the_pipeline() {
    // Arrange
    let config = load_config(&fixture_path("valid.hcl"), false).unwrap();

    // Act
    let (outcome, batches) = run_with("pipe.log", config);
    let summary = &outcome.summary;

    // Assert
    assert!(batches.is_empty());
    assert_eq!(summary.total_events, 4);
    assert_eq!(summary.diagnostics.filtered_out, 1);
    assert!(summary.top_slowest.iter().all(|t| t.entries.len() == 1));

    let ranges: Vec<&str> = summary.histogram[0]
        .buckets
        .iter()
        .map(|b| b.range.as_str())
        .collect();
    assert_eq!(ranges.len(), 4);

    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(outcome.alerts[0].scope, AlertTarget::Service("A".to_string()));
    assert_eq!(outcome.alerts[0].metric, AlertMetric::ErrorRate);
    assert_eq!(outcome.alerts[0].threshold, 40.0);
}

#[test]
fn invalid_config_reports_every_problem() {
    // Act
    let err = load_config(&fixture_path("invalid.hcl"), false).unwrap_err();

    // Assert
    let ConfigError::Validation { report } = err else {
        panic!("expected validation error, got {err:?}");
    };
    let fields: Vec<&str> = report.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(
        fields,
        vec!["input.delimiter", "filter.until", "histogram.boundaries"]
    );
}
