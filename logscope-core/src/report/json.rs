use crate::pipeline::{Alert, Summary};
use crate::report::ReportSink;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a Summary,
    alerts: &'a [Alert],
}

pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ReportSink for JsonSink<W> {
    fn write_report(&mut self, summary: &Summary, alerts: &[Alert]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, &JsonReport { summary, alerts })?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// One compact JSON line per alert.
    fn write_alerts(&mut self, alerts: &[Alert]) -> io::Result<()> {
        for alert in alerts {
            serde_json::to_writer(&mut self.out, alert)?;
            writeln!(self.out)?;
        }
        self.out.flush()
    }
}
