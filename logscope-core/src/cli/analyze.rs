use crate::cli::check::print_config_error;
use crate::conf::{AnalyzerSpec, ConfigError, load_spec, validate};
use crate::pipeline::{
    Alert, AlertScope, CancelToken, ChannelSource, IterSource, LineSource, PipelineConfig,
    PipelineError, STREAM_POLL_INTERVAL, StreamController, Summary, Termination,
};
use crate::report::{PrettySink, ReportFormat, ReportSink, sink};
use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "logs/mock_data.txt";

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Log file to analyze
    #[arg(short, long, conflicts_with = "stream")]
    pub file: Option<PathBuf>,

    /// Read an unbounded stream from stdin until EOF or Ctrl-C
    #[arg(long)]
    pub stream: bool,

    /// HCL config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Pretty)]
    pub format: ReportFormat,

    /// Also write the report to a file (.csv for CSV, JSON otherwise)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only count events of this type (case-insensitive)
    #[arg(long)]
    pub event_type: Option<String>,

    /// Only count these services (repeatable)
    #[arg(long = "service")]
    pub services: Vec<String>,

    /// Inclusive lower time bound
    #[arg(long)]
    pub since: Option<String>,

    /// Exclusive upper time bound
    #[arg(long)]
    pub until: Option<String>,

    /// auto, comma, tab, pipe, or a single character
    #[arg(long)]
    pub delimiter: Option<String>,

    #[arg(long)]
    pub top_n: Option<usize>,

    /// Error rate alert threshold, in percent
    #[arg(long)]
    pub error_threshold: Option<f64>,

    /// Average latency alert threshold, in ms
    #[arg(long)]
    pub latency_threshold: Option<f64>,

    #[arg(long, value_enum)]
    pub alert_scope: Option<AlertScope>,

    /// Re-evaluate alerts every N admitted events while streaming
    #[arg(long)]
    pub alert_every: Option<u64>,

    /// Stop streaming after this long without input (0 disables)
    #[arg(long)]
    pub idle_timeout_ms: Option<u64>,
}

impl AnalyzeArgs {
    /// Layers flag values over a spec loaded from file.
    pub fn apply(&self, spec: &mut AnalyzerSpec) {
        if let Some(d) = &self.delimiter {
            spec.input.delimiter = Some(d.clone());
        }
        if let Some(t) = &self.event_type {
            spec.filter.event_type = Some(t.clone());
        }
        if !self.services.is_empty() {
            spec.filter.services = Some(self.services.clone());
        }
        if let Some(s) = &self.since {
            spec.filter.since = Some(s.clone());
        }
        if let Some(u) = &self.until {
            spec.filter.until = Some(u.clone());
        }
        if let Some(n) = self.top_n {
            spec.top_n = Some(n);
        }
        if let Some(x) = self.error_threshold {
            spec.alerts.error_rate_percent = Some(x);
        }
        if let Some(x) = self.latency_threshold {
            spec.alerts.latency_ms = Some(x);
        }
        if let Some(scope) = self.alert_scope {
            spec.alerts.scope = Some(scope);
        }
        if let Some(n) = self.alert_every {
            spec.alerts.cadence = Some("every_events".to_string());
            spec.alerts.every_events = Some(n);
        }
        if let Some(ms) = self.idle_timeout_ms {
            spec.stream.idle_timeout_ms = Some(ms);
        }
    }
}

/// Loads the optional config file, layers the flags over it, and validates
/// the result.
pub fn resolve_config(args: &AnalyzeArgs) -> Result<PipelineConfig, ConfigError> {
    let mut spec = match &args.config {
        Some(path) => load_spec(path)?,
        None => AnalyzerSpec::default(),
    };
    args.apply(&mut spec);

    validate(&spec, args.stream).map_err(|report| ConfigError::Validation { report })
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(err) => {
            print_config_error(&err, !io::stderr().is_terminal(), false);
            std::process::exit(1);
        }
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel()).context("failed to install Ctrl-C handler")?;
    }

    let mut source = open_source(&args)?;
    let mut controller = StreamController::new(config);

    let color = io::stderr().is_terminal();
    let mut live = PrettySink::new(io::stderr(), color);
    let mut on_alerts = |alerts: &[Alert]| {
        if color {
            if let Err(e) = live.write_alerts(alerts) {
                tracing::debug!(error = %e, "failed to print alerts");
            }
            return;
        }
        for alert in alerts {
            tracing::warn!(
                scope = %alert.scope,
                metric = %alert.metric,
                observed = alert.observed,
                threshold = alert.threshold,
                "alert threshold exceeded"
            );
        }
    };

    let outcome = match controller.run(source.as_mut(), &cancel, &mut on_alerts) {
        Ok(outcome) => outcome,
        Err(err) => {
            // Report what was accumulated before the read failed.
            let PipelineError::Read { lines_read, .. } = &err;
            tracing::error!(lines_read, error = %err, "input failed, reporting partial results");
            let summary = controller.summary(Termination::SourceError);
            let alerts = controller.alerts();
            deliver(&args, &summary, &alerts)?;
            return Err(err.into());
        }
    };

    deliver(&args, &outcome.summary, &outcome.alerts)
}

/// Writes the report to stdout and, when `--output` is set, to that file.
pub fn deliver(args: &AnalyzeArgs, summary: &Summary, alerts: &[Alert]) -> Result<()> {
    write_stdout(args.format, summary, alerts)?;

    if let Some(path) = &args.output {
        write_file(path, summary, alerts)?;
        tracing::info!(
            path = %path.display(),
            termination = ?summary.termination,
            "report written"
        );
    }

    Ok(())
}

fn open_source(args: &AnalyzeArgs) -> Result<Box<dyn LineSource>> {
    if args.stream {
        return Ok(Box::new(ChannelSource::spawn(
            || io::stdin().lock(),
            STREAM_POLL_INTERVAL,
        )));
    }

    let path = args
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let file = File::open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Ok(Box::new(IterSource::from_reader(BufReader::new(file))))
}

fn write_stdout(format: ReportFormat, summary: &Summary, alerts: &[Alert]) -> Result<()> {
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut out = stdout.lock();
    sink(format, &mut out, color)
        .write_report(summary, alerts)
        .context("failed to write report")?;
    out.flush()?;
    Ok(())
}

fn write_file(path: &Path, summary: &Summary, alerts: &[Alert]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    sink(ReportFormat::from_path(path), &mut out, false)
        .write_report(summary, alerts)
        .with_context(|| format!("failed to write report file {}", path.display()))?;
    out.flush()?;
    Ok(())
}
