use crate::pipeline::{Alert, DerivedStats, Summary};
use crate::report::ReportSink;
use std::io::{self, Write};

const STATS_HEADER: &str =
    "scope,service,count,error_count,average_latency_ms,error_rate,min_latency_ms,max_latency_ms";
const ALERTS_HEADER: &str = "alert_scope,metric,observed,threshold";

/// Quotes a field when it holds a delimiter, quote or line break.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn stats_row(scope: &str, service: &str, stats: &DerivedStats) -> String {
    format!(
        "{},{},{},{},{:.2},{:.2},{:.2},{:.2}\n",
        scope,
        field(service),
        stats.count,
        stats.error_count,
        stats.average_latency_ms,
        stats.error_rate,
        stats.min_latency_ms,
        stats.max_latency_ms
    )
}

fn alert_row(alert: &Alert) -> String {
    format!(
        "{},{},{:.2},{:.2}\n",
        field(&alert.scope.to_string()),
        alert.metric,
        alert.observed,
        alert.threshold
    )
}

/// Per-service stats table, then the alerts table after a blank line.
pub struct CsvSink<W> {
    out: W,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn write_report(&mut self, summary: &Summary, alerts: &[Alert]) -> io::Result<()> {
        let mut csv = format!("{STATS_HEADER}\n");
        csv.push_str(&stats_row("overall", "", &summary.overall));
        for service in &summary.per_service {
            csv.push_str(&stats_row("service", &service.service, &service.stats));
        }

        csv.push('\n');
        csv.push_str(ALERTS_HEADER);
        csv.push('\n');
        for alert in alerts {
            csv.push_str(&alert_row(alert));
        }

        self.out.write_all(csv.as_bytes())?;
        self.out.flush()
    }

    fn write_alerts(&mut self, alerts: &[Alert]) -> io::Result<()> {
        for alert in alerts {
            self.out.write_all(alert_row(alert).as_bytes())?;
        }
        self.out.flush()
    }
}
