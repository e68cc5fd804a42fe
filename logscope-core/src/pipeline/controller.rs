use crate::pipeline::aggregation::MetricAggregator;
use crate::pipeline::alert::{Alert, AlertHandler, AlertThresholds, evaluate};
use crate::pipeline::constants::{DEFAULT_ERROR_LABEL, DEFAULT_LATENCY_BUCKETS_MS, DEFAULT_TOP_N};
use crate::pipeline::filter::FilterSpec;
use crate::pipeline::histogram::HistogramBucketer;
use crate::pipeline::parse::{DelimiterPolicy, LineParser, is_skippable};
use crate::pipeline::source::{CancelToken, LineSource, Pulled};
use crate::pipeline::summary::{RunDiagnostics, ServiceTopN, SlowEvent, Summary, Termination};
use crate::pipeline::top_n::TopNTracker;
use crate::pipeline::types::FailureReason;
use std::io;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read input after {lines_read} lines: {source}")]
    Read {
        lines_read: u64,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Consume to exhaustion, then evaluate alerts once.
    Finite,
    /// Run until end-of-stream, cancellation, or the optional idle timeout.
    Streaming { idle_timeout: Option<Duration> },
}

/// When a streaming run re-evaluates alerts before it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertCadence {
    #[default]
    EndOfRun,
    EveryEvent,
    EveryEvents(NonZeroU64),
    Interval(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub delimiter: DelimiterPolicy,
    pub error_label: String,
    pub filter: FilterSpec,
    pub thresholds: AlertThresholds,
    pub histogram_boundaries: Arc<[f64]>,
    pub top_n: usize,
    pub mode: RunMode,
    pub alert_cadence: AlertCadence,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: DelimiterPolicy::Auto,
            error_label: DEFAULT_ERROR_LABEL.to_string(),
            filter: FilterSpec::default(),
            thresholds: AlertThresholds::default(),
            histogram_boundaries: Arc::from(DEFAULT_LATENCY_BUCKETS_MS),
            top_n: DEFAULT_TOP_N,
            mode: RunMode::Finite,
            alert_cadence: AlertCadence::EndOfRun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Skipped,
    Failed(FailureReason),
    Filtered,
    Admitted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub summary: Summary,
    pub alerts: Vec<Alert>,
}

struct AlertSchedule {
    cadence: AlertCadence,
    pending: u64,
    last: Instant,
}

impl AlertSchedule {
    fn new(cadence: AlertCadence, now: Instant) -> Self {
        Self {
            cadence,
            pending: 0,
            last: now,
        }
    }

    fn on_admitted(&mut self, now: Instant) -> bool {
        self.pending += 1;
        let due = match self.cadence {
            AlertCadence::EndOfRun => false,
            AlertCadence::EveryEvent => true,
            AlertCadence::EveryEvents(n) => self.pending >= n.get(),
            AlertCadence::Interval(every) => now.duration_since(self.last) >= every,
        };
        if due {
            self.reset(now);
        }
        due
    }

    /// Interval cadence keeps ticking while the source is quiet, but only
    /// when something was admitted since the last evaluation.
    fn on_idle(&mut self, now: Instant) -> bool {
        let due = match self.cadence {
            AlertCadence::Interval(every) => {
                self.pending > 0 && now.duration_since(self.last) >= every
            }
            _ => false,
        };
        if due {
            self.reset(now);
        }
        due
    }

    fn reset(&mut self, now: Instant) {
        self.pending = 0;
        self.last = now;
    }
}

/// Drives raw lines through parse, filter and the three collectors.
///
/// All state is owned here and touched by one line at a time, in arrival
/// order. The collectors keep whatever was accumulated when a run stops, so
/// [`StreamController::summary`] still works after a source error.
pub struct StreamController {
    config: PipelineConfig,
    parser: LineParser,
    aggregator: MetricAggregator,
    top_n: TopNTracker,
    histogram: HistogramBucketer,
    diagnostics: RunDiagnostics,
}

impl StreamController {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            parser: LineParser::new(config.delimiter),
            aggregator: MetricAggregator::new(config.error_label.clone()),
            top_n: TopNTracker::new(config.top_n),
            histogram: HistogramBucketer::new(Arc::clone(&config.histogram_boundaries)),
            diagnostics: RunDiagnostics::default(),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &MetricAggregator {
        &self.aggregator
    }

    pub fn top_n(&self) -> &TopNTracker {
        &self.top_n
    }

    pub fn histogram(&self) -> &HistogramBucketer {
        &self.histogram
    }

    pub fn diagnostics(&self) -> &RunDiagnostics {
        &self.diagnostics
    }

    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        self.diagnostics.lines_read += 1;

        if is_skippable(line) {
            self.diagnostics.skipped_lines += 1;
            return LineOutcome::Skipped;
        }

        let event = match self.parser.parse(line) {
            Ok(event) => event,
            Err(failure) => {
                tracing::warn!(
                    reason = %failure.reason,
                    line = %failure.line,
                    "skipping malformed log line"
                );
                let reason = failure.reason;
                self.diagnostics.record_failure(failure);
                return LineOutcome::Failed(reason);
            }
        };

        if !self.config.filter.admits(&event) {
            self.diagnostics.filtered_out += 1;
            return LineOutcome::Filtered;
        }

        self.aggregator.record(&event);
        self.top_n.offer(&event);
        self.histogram.classify(&event);
        self.diagnostics.admitted += 1;

        LineOutcome::Admitted
    }

    /// Alerts for the stats accumulated so far.
    pub fn alerts(&self) -> Vec<Alert> {
        evaluate(&self.aggregator.finalize(), &self.config.thresholds)
    }

    pub fn summary(&self, termination: Termination) -> Summary {
        let snapshot = self.aggregator.finalize();

        let top_slowest = snapshot
            .services
            .iter()
            .map(|s| ServiceTopN {
                service: s.service.clone(),
                entries: self
                    .top_n
                    .snapshot(&s.service)
                    .iter()
                    .map(SlowEvent::from)
                    .collect(),
            })
            .collect();

        let mut diagnostics = self.diagnostics.clone();
        diagnostics.delimiter = self.parser.delimiter().map(|d| d.escape_default().to_string());

        Summary {
            total_events: snapshot.overall.count,
            parse_failures: diagnostics.parse_failures,
            overall: snapshot.overall,
            per_service: snapshot.services,
            top_slowest,
            histogram: self.histogram.snapshot(),
            diagnostics,
            termination,
        }
    }

    /// Pulls from `source` until it is exhausted, `cancel` fires, or (when
    /// streaming) the idle timeout elapses, then evaluates alerts once more
    /// against the final state.
    pub fn run<S, H>(
        &mut self,
        source: &mut S,
        cancel: &CancelToken,
        handler: &mut H,
    ) -> Result<RunOutcome, PipelineError>
    where
        S: LineSource + ?Sized,
        H: AlertHandler + ?Sized,
    {
        let (streaming, idle_timeout) = match self.config.mode {
            RunMode::Finite => (false, None),
            RunMode::Streaming { idle_timeout } => (true, idle_timeout),
        };

        tracing::info!(
            streaming,
            delimiter = ?self.config.delimiter,
            top_n = self.config.top_n,
            "log analysis started"
        );

        let mut schedule = AlertSchedule::new(self.config.alert_cadence, Instant::now());
        let mut last_line = Instant::now();

        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }

            let pulled = source.pull().map_err(|source| PipelineError::Read {
                lines_read: self.diagnostics.lines_read,
                source,
            })?;

            match pulled {
                Pulled::Line(line) => {
                    last_line = Instant::now();
                    let outcome = self.process_line(&line);

                    if streaming
                        && outcome == LineOutcome::Admitted
                        && schedule.on_admitted(last_line)
                    {
                        self.emit(handler);
                    }
                }
                Pulled::Idle => {
                    let now = Instant::now();

                    if streaming && schedule.on_idle(now) {
                        self.emit(handler);
                    }

                    if let Some(timeout) = idle_timeout {
                        if now.duration_since(last_line) >= timeout {
                            break Termination::IdleTimeout;
                        }
                    }
                }
                Pulled::Exhausted => break Termination::Exhausted,
            }
        };

        let summary = self.summary(termination);
        let alerts = self.alerts();

        tracing::info!(
            termination = ?termination,
            lines_read = summary.diagnostics.lines_read,
            admitted = summary.total_events,
            parse_failures = summary.parse_failures,
            alerts = alerts.len(),
            "log analysis finished"
        );

        Ok(RunOutcome { summary, alerts })
    }

    fn emit<H: AlertHandler + ?Sized>(&self, handler: &mut H) {
        let alerts = self.alerts();
        if !alerts.is_empty() {
            handler.on_alerts(&alerts);
        }
    }
}
