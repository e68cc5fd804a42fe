use crate::pipeline::tests::test_helpers::ts;
use crate::pipeline::{
    Alert, AlertCadence, AlertScope, AlertThresholds, CancelToken, DelimiterPolicy, FailureReason,
    FilterSpec, IterSource, LineOutcome, LineSource, PipelineConfig, PipelineError, Pulled,
    RunMode, StreamController, Termination, TimeWindow,
};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::io;
use std::num::NonZeroU64;
use std::time::Duration;

fn lines(raw: &[&str]) -> IterSource<std::vec::IntoIter<io::Result<String>>> {
    let owned: Vec<io::Result<String>> = raw.iter().map(|l| Ok(l.to_string())).collect();
    IterSource::new(owned.into_iter())
}

fn no_alerts() -> impl FnMut(&[Alert]) {
    |_: &[Alert]| {}
}

/// Scripted source: yields its items in order, then idles forever, and
/// cancels `token` once `cancel_after` lines have been handed out.
struct ScriptedSource {
    items: VecDeque<io::Result<Pulled>>,
    served: usize,
    cancel_after: Option<(usize, CancelToken)>,
}

impl ScriptedSource {
    fn new(items: Vec<io::Result<Pulled>>) -> Self {
        Self {
            items: items.into(),
            served: 0,
            cancel_after: None,
        }
    }

    fn cancel_after(mut self, k: usize, token: CancelToken) -> Self {
        self.cancel_after = Some((k, token));
        self
    }
}

impl LineSource for ScriptedSource {
    fn pull(&mut self) -> io::Result<Pulled> {
        let next = self.items.pop_front().unwrap_or(Ok(Pulled::Idle));
        if matches!(next, Ok(Pulled::Line(_))) {
            self.served += 1;
            if let Some((k, token)) = &self.cancel_after {
                if self.served >= *k {
                    token.cancel();
                }
            }
        }
        next
    }
}

fn line(raw: &str) -> io::Result<Pulled> {
    Ok(Pulled::Line(raw.to_string()))
}

fn streaming(idle_timeout: Option<Duration>) -> PipelineConfig {
    PipelineConfig {
        mode: RunMode::Streaming { idle_timeout },
        ..Default::default()
    }
}

#[test]
fn finite_run_summarizes_all_lines() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig::default());
    let mut source = lines(&[
        "# TIMESTAMP | SERVICE | TYPE | LATENCY",
        "2024-01-01T00:00:00Z | A | ERROR | 100",
        "2024-01-01T00:00:01Z | A | SUCCESS | 50ms",
        "",
        "2024-01-01T00:00:02Z | B | SUCCESS | 10",
    ]);

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap();

    // Assert
    let summary = outcome.summary;
    assert_eq!(summary.termination, Termination::Exhausted);
    assert_eq!(summary.total_events, 3);
    assert_eq!(summary.parse_failures, 0);
    assert_eq!(summary.diagnostics.lines_read, 5);
    assert_eq!(summary.diagnostics.skipped_lines, 2);
    assert_eq!(summary.diagnostics.delimiter.as_deref(), Some("|"));
    assert_eq!(summary.per_service.len(), 2);
    assert_eq!(summary.per_service[0].service, "A");
    assert_eq!(summary.per_service[0].stats.average_latency_ms, 75.0);
    assert_eq!(summary.top_slowest[0].entries[0].latency_ms, 100.0);
    assert_eq!(summary.top_slowest[0].entries[0].timestamp, ts("2024-01-01T00:00:00Z"));
    assert_eq!(summary.histogram.len(), 2);

    // Default thresholds (20%, 100ms): overall 33.3% and service A 50% fire.
    assert_eq!(outcome.alerts.len(), 2);
}

#[test]
fn malformed_line_is_counted_and_ignored() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig::default());
    let mut source = lines(&[
        "2024-01-01T00:00:00Z,api,SUCCESS,10",
        "bad,line",
        "2024-01-01T00:00:01Z,api,SUCCESS,20",
    ]);

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap();

    // Assert
    let summary = outcome.summary;
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.total_events, 2);
    assert_eq!(summary.per_service[0].stats.count, 2);
    assert_eq!(
        summary.diagnostics.failures_by_reason.get(&FailureReason::FieldCount),
        Some(&1)
    );
    assert_eq!(summary.diagnostics.failure_samples[0].line, "bad,line");
}

#[test]
fn process_line_reports_each_outcome() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig {
        delimiter: DelimiterPolicy::Fixed(','),
        filter: FilterSpec {
            event_type: Some("ERROR".to_string()),
            ..Default::default()
        },
        ..Default::default()
    });

    // Assert
    assert_eq!(controller.process_line("   "), LineOutcome::Skipped);
    assert_eq!(
        controller.process_line("2024-01-01,api,ERROR,-3"),
        LineOutcome::Failed(FailureReason::BadLatency)
    );
    assert_eq!(
        controller.process_line("2024-01-01,api,INFO,3"),
        LineOutcome::Filtered
    );
    assert_eq!(
        controller.process_line("2024-01-01,api,ERROR,3"),
        LineOutcome::Admitted
    );
    assert_eq!(controller.diagnostics().filtered_out, 1);
    assert_eq!(controller.diagnostics().admitted, 1);
}

#[test]
fn window_end_is_exclusive() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig {
        filter: FilterSpec {
            window: TimeWindow {
                start: Some(ts("2024-01-01T00:00:00Z")),
                end: Some(ts("2024-01-01T01:00:00Z")),
            },
            ..Default::default()
        },
        ..Default::default()
    });
    let mut source = lines(&[
        "2024-01-01T00:00:00Z,api,INFO,1",
        "2024-01-01T00:30:00Z,api,INFO,1",
        "2024-01-01T01:00:00Z,api,INFO,1",
    ]);

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap();

    // Assert
    assert_eq!(outcome.summary.total_events, 2);
    assert_eq!(outcome.summary.diagnostics.filtered_out, 1);
}

#[test]
fn cancellation_stops_between_pulls_and_keeps_state() {
    // Arrange
    let token = CancelToken::new();
    let mut controller = StreamController::new(streaming(None));
    let mut source = ScriptedSource::new(vec![
        line("2024-01-01T00:00:00Z,api,INFO,1"),
        line("2024-01-01T00:00:01Z,api,INFO,2"),
        line("2024-01-01T00:00:02Z,api,INFO,3"),
        line("2024-01-01T00:00:03Z,api,INFO,4"),
    ])
    .cancel_after(2, token.clone());

    // Act
    let outcome = controller
        .run(&mut source, &token, &mut no_alerts())
        .unwrap();

    // Assert
    assert_eq!(outcome.summary.termination, Termination::Cancelled);
    assert_eq!(outcome.summary.total_events, 2);
    assert_eq!(outcome.summary.overall.average_latency_ms, 1.5);
}

#[test]
fn idle_timeout_ends_stream_without_error() {
    // Arrange
    let mut controller = StreamController::new(streaming(Some(Duration::ZERO)));
    let mut source = ScriptedSource::new(vec![line("2024-01-01T00:00:00Z,api,INFO,1")]);

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap();

    // Assert
    assert_eq!(outcome.summary.termination, Termination::IdleTimeout);
    assert_eq!(outcome.summary.total_events, 1);
}

#[test]
fn end_of_stream_terminates_streaming_mode() {
    // Arrange
    let mut controller = StreamController::new(streaming(None));
    let mut source = ScriptedSource::new(vec![
        line("2024-01-01T00:00:00Z,api,INFO,1"),
        Ok(Pulled::Idle),
        Ok(Pulled::Exhausted),
    ]);

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap();

    // Assert
    assert_eq!(outcome.summary.termination, Termination::Exhausted);
}

#[test]
fn read_error_propagates_and_partial_state_remains() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig::default());
    let mut source = ScriptedSource::new(vec![
        line("2024-01-01T00:00:00Z,api,INFO,5"),
        Err(io::Error::other("disk gone")),
    ]);

    // Act
    let err = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap_err();

    // Assert
    let PipelineError::Read { lines_read, .. } = err;
    assert_eq!(lines_read, 1);
    let summary = controller.summary(Termination::SourceError);
    assert_eq!(summary.total_events, 1);
    assert_eq!(summary.termination, Termination::SourceError);

    assert_eq!(controller.config().mode, RunMode::Finite);
    assert_eq!(controller.aggregator().service("api").map(|s| s.count()), Some(1));
    assert_eq!(controller.top_n().snapshot("api").len(), 1);
    assert!(controller.histogram().service("api").is_some());
}

#[test]
fn stray_line_before_detection_does_not_lock_the_delimiter() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig::default());
    let mut source = lines(&[
        "x,y,z,w",
        "2024-01-01T00:00:00Z | api | INFO | 10",
        "2024-01-01T00:00:01Z | api | INFO | 10",
        "2024-01-01T00:00:02Z | api | INFO | 10",
        "2024-01-01T00:00:03Z | api | INFO | 10",
        "2024-01-01T00:00:04Z | api | INFO | 10",
    ]);

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut no_alerts())
        .unwrap();

    // Assert
    let diagnostics = &outcome.summary.diagnostics;
    assert_eq!(outcome.summary.total_events, 5);
    assert_eq!(outcome.summary.parse_failures, 1);
    assert_eq!(diagnostics.delimiter.as_deref(), Some("|"));
    assert_eq!(
        diagnostics.failures_by_reason.get(&FailureReason::BadTimestamp),
        Some(&1)
    );
}

#[test]
fn streaming_alerts_follow_cadence() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig {
        mode: RunMode::Streaming { idle_timeout: None },
        alert_cadence: AlertCadence::EveryEvents(NonZeroU64::new(2).unwrap()),
        thresholds: AlertThresholds {
            error_rate_percent: 10.0,
            latency_ms: 1_000.0,
            scope: AlertScope::Overall,
        },
        ..Default::default()
    });
    let mut source = ScriptedSource::new(vec![
        line("2024-01-01T00:00:00Z,api,ERROR,1"),
        line("2024-01-01T00:00:01Z,api,ERROR,1"),
        line("2024-01-01T00:00:02Z,api,ERROR,1"),
        line("2024-01-01T00:00:03Z,api,ERROR,1"),
        line("2024-01-01T00:00:04Z,api,ERROR,1"),
        Ok(Pulled::Exhausted),
    ]);
    let mut batches: Vec<Vec<Alert>> = Vec::new();

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut |alerts: &[Alert]| {
            batches.push(alerts.to_vec())
        })
        .unwrap();

    // Assert
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.len() == 1));
    assert_eq!(outcome.alerts.len(), 1);
}

#[test]
fn finite_mode_never_emits_periodic_alerts() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig {
        alert_cadence: AlertCadence::EveryEvent,
        ..Default::default()
    });
    let mut source = lines(&["2024-01-01T00:00:00Z,api,ERROR,500"]);
    let mut calls = 0;

    // Act
    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut |_: &[Alert]| calls += 1)
        .unwrap();

    // Assert
    assert_eq!(calls, 0);
    assert!(!outcome.alerts.is_empty());
}

#[test]
fn summary_is_stable_without_new_lines() {
    // Arrange
    let mut controller = StreamController::new(PipelineConfig::default());
    controller.process_line("2024-01-01T00:00:00Z,api,INFO,5");

    // Act
    let first = controller.summary(Termination::Cancelled);
    let second = controller.summary(Termination::Cancelled);

    // Assert
    assert_eq!(first, second);
}
