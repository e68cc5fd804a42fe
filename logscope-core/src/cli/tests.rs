use crate::cli::{AnalyzeArgs, deliver, resolve_config};
use crate::conf::ConfigError;
use crate::pipeline::{PipelineConfig, StreamController, Termination};
use crate::report::ReportFormat;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

#[test]
fn flags_override_config_file() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("logscope.hcl");
    fs::write(&path, "top_n = 3\n\nalerts {\n  latency_ms = 250\n}\n").unwrap();
    let args = AnalyzeArgs {
        config: Some(path),
        top_n: Some(7),
        ..Default::default()
    };

    // Act
    let config = resolve_config(&args).unwrap();

    // Assert
    assert_eq!(config.top_n, 7);
    assert_eq!(config.thresholds.latency_ms, 250.0);
}

#[test]
fn invalid_flag_is_returned_as_validation_report() {
    // Arrange
    let args = AnalyzeArgs {
        delimiter: Some("semicolon".to_string()),
        alert_every: Some(0),
        ..Default::default()
    };

    // Act
    let err = resolve_config(&args).unwrap_err();

    // Assert
    let ConfigError::Validation { report } = err else {
        panic!("expected validation error, got {err:?}");
    };
    let fields: Vec<&str> = report.errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["input.delimiter", "alerts.every_events"]);
}

#[test]
fn partial_report_still_reaches_output_file() {
    // Arrange
    let dir = tempdir().unwrap();
    let path = dir.path().join("partial.json");
    let mut controller = StreamController::new(PipelineConfig::default());
    controller.process_line("2024-01-01T00:00:00Z,api,INFO,5");
    let summary = controller.summary(Termination::SourceError);
    let args = AnalyzeArgs {
        format: ReportFormat::Json,
        output: Some(path.clone()),
        ..Default::default()
    };

    // Act
    deliver(&args, &summary, &controller.alerts()).unwrap();

    // Assert
    let text = fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["summary"]["termination"], "source_error");
    assert_eq!(json["summary"]["total_events"], 1);
}
