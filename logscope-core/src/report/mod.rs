//! Report sinks.
//!
//! Every output format consumes the same [`Summary`] and alert list; the
//! pipeline never knows which one is in use.

mod csv;
mod json;
mod pretty;


pub use csv::CsvSink;
pub use json::JsonSink;
pub use pretty::PrettySink;

use crate::pipeline::{Alert, Summary};
use std::io::{self, Write};
use std::path::Path;

pub trait ReportSink {
    fn write_report(&mut self, summary: &Summary, alerts: &[Alert]) -> io::Result<()>;

    /// Alerts raised mid-stream, before the final report.
    fn write_alerts(&mut self, alerts: &[Alert]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Pretty,
    Json,
    Csv,
}

impl ReportFormat {
    /// `.csv` files get CSV, everything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ReportFormat::Csv,
            _ => ReportFormat::Json,
        }
    }
}

pub fn sink<'a, W>(format: ReportFormat, out: W, color: bool) -> Box<dyn ReportSink + 'a>
where
    W: Write + 'a,
{
    match format {
        ReportFormat::Pretty => Box::new(PrettySink::new(out, color)),
        ReportFormat::Json => Box::new(JsonSink::new(out)),
        ReportFormat::Csv => Box::new(CsvSink::new(out)),
    }
}
