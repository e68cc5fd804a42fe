use crate::pipeline::{Alert, AlertMetric, ServiceHistogram, Summary};
use crate::report::ReportSink;
use owo_colors::{OwoColorize, Style};
use std::io::{self, Write};

/// Human-readable report, the format used on a terminal.
pub struct PrettySink<W> {
    out: W,
    color: bool,
}

impl<W: Write> PrettySink<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn render_alert(&self, alert: &Alert) -> String {
        let (what, unit) = match alert.metric {
            AlertMetric::ErrorRate => ("error rate", "%"),
            AlertMetric::Latency => ("average latency", "ms"),
        };
        format!(
            "{} {} {} is high: {:.2}{} (threshold: {}{})\n",
            self.paint("ALERT:", Style::new().red().bold()),
            alert.scope,
            what,
            alert.observed,
            unit,
            alert.threshold,
            unit
        )
    }

    fn render_histogram(&self, histogram: &ServiceHistogram, out: &mut String) {
        let total: u64 = histogram.buckets.iter().map(|b| b.count).sum();
        if total == 0 {
            return;
        }

        out.push_str(&format!(
            "  {} (p95 ≈ {}ms | p99 ≈ {}ms)\n",
            histogram.service, histogram.p95_ms, histogram.p99_ms
        ));
        for bucket in histogram.buckets.iter().filter(|b| b.count > 0) {
            let pct = (bucket.count as f64 / total as f64) * 100.0;
            let bars = ((pct / 5.0).floor() as usize).max(1);
            out.push_str(&format!(
                "    {:<12} {:<20} {:>5.1}% ({})\n",
                bucket.range,
                "█".repeat(bars),
                pct,
                bucket.count
            ));
        }
    }

    pub fn render(&self, summary: &Summary, alerts: &[Alert]) -> String {
        let mut out = String::new();
        let heading = Style::new().bold();

        out.push_str(&format!(
            "{}\n\
             ===================\n\
             events: {} | parse failures: {} | filtered out: {} | skipped: {}\n\n",
            self.paint("Log Metrics Summary", heading),
            summary.total_events,
            summary.parse_failures,
            summary.diagnostics.filtered_out,
            summary.diagnostics.skipped_lines
        ));

        out.push_str(&format!(
            "Overall: avg latency {:.2} ms | error rate {:.2}%\n\n",
            summary.overall.average_latency_ms, summary.overall.error_rate
        ));

        if summary.per_service.is_empty() {
            out.push_str("Services: <no events>\n\n");
        } else {
            out.push_str(&format!("{}\n", self.paint("Services:", heading)));
            out.push_str(&format!(
                "  {:<20} {:>8} {:>12} {:>10} {:>10}\n",
                "service", "events", "avg ms", "errors", "max ms"
            ));
            for s in &summary.per_service {
                out.push_str(&format!(
                    "  {:<20} {:>8} {:>12.2} {:>9.2}% {:>10.2}\n",
                    s.service,
                    s.stats.count,
                    s.stats.average_latency_ms,
                    s.stats.error_rate,
                    s.stats.max_latency_ms
                ));
            }
            out.push('\n');
        }

        if summary.top_slowest.iter().any(|t| !t.entries.is_empty()) {
            out.push_str(&format!("{}\n", self.paint("Slowest events:", heading)));
            for top in summary.top_slowest.iter().filter(|t| !t.entries.is_empty()) {
                out.push_str(&format!("  {}\n", top.service));
                for e in &top.entries {
                    out.push_str(&format!(
                        "    {:>10.2} ms  {}  {}\n",
                        e.latency_ms,
                        e.timestamp.to_rfc3339(),
                        e.event_type
                    ));
                }
            }
            out.push('\n');
        }

        if !summary.histogram.is_empty() {
            out.push_str(&format!("{}\n", self.paint("Latency:", heading)));
            for h in &summary.histogram {
                self.render_histogram(h, &mut out);
            }
            out.push('\n');
        }

        if summary.parse_failures > 0 {
            let reasons: Vec<String> = summary
                .diagnostics
                .failures_by_reason
                .iter()
                .map(|(reason, count)| format!("{reason}={count}"))
                .collect();
            out.push_str(&format!(
                "{} {}\n\n",
                self.paint("Malformed lines:", Style::new().yellow()),
                reasons.join(" ")
            ));
        }

        if alerts.is_empty() {
            out.push_str(&format!("{}\n", self.paint("No alerts", Style::new().green())));
        } else {
            for alert in alerts {
                out.push_str(&self.render_alert(alert));
            }
        }

        out
    }
}

impl<W: Write> ReportSink for PrettySink<W> {
    fn write_report(&mut self, summary: &Summary, alerts: &[Alert]) -> io::Result<()> {
        let rendered = self.render(summary, alerts);
        self.out.write_all(rendered.as_bytes())?;
        self.out.flush()
    }

    fn write_alerts(&mut self, alerts: &[Alert]) -> io::Result<()> {
        for alert in alerts {
            let line = self.render_alert(alert);
            self.out.write_all(line.as_bytes())?;
        }
        self.out.flush()
    }
}
