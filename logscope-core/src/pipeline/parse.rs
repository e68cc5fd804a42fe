use crate::pipeline::constants::{DELIMITER_CANDIDATES, EXPECTED_FIELDS};
use crate::pipeline::types::{FailureReason, LogEvent, ParseFailure};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterPolicy {
    #[default]
    Auto,
    Fixed(char),
}

/// Blank lines and `#` comments carry no event and are not failures.
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Candidates that split `line` into exactly the expected number of fields,
/// in priority order.
fn candidate_delimiters(line: &str) -> impl Iterator<Item = char> + '_ {
    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .filter(move |d| line.split(*d).count() == EXPECTED_FIELDS)
}

/// First candidate that splits `line` into exactly the expected number of fields.
pub fn detect_delimiter(line: &str) -> Option<char> {
    candidate_delimiters(line).next()
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Latency in milliseconds, optionally suffixed with `ms` (any case).
pub fn parse_latency(raw: &str) -> Option<f64> {
    let digits = match raw.len().checked_sub(2).and_then(|at| raw.get(at..)) {
        Some(suffix) if suffix.eq_ignore_ascii_case("ms") => &raw[..raw.len() - 2],
        _ => raw,
    };

    digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

pub fn parse_line(line: &str, delimiter: char) -> Result<LogEvent, ParseFailure> {
    let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    let [timestamp, service, event_type, latency] = fields.as_slice() else {
        return Err(ParseFailure::new(line, FailureReason::FieldCount));
    };

    if service.is_empty() || event_type.is_empty() {
        return Err(ParseFailure::new(line, FailureReason::EmptyField));
    }

    let Some(ts) = parse_timestamp(timestamp) else {
        return Err(ParseFailure::new(line, FailureReason::BadTimestamp));
    };

    let Some(latency_ms) = parse_latency(latency) else {
        return Err(ParseFailure::new(line, FailureReason::BadLatency));
    };

    Ok(LogEvent::from_parts(
        ts, timestamp, service, event_type, latency_ms, latency,
    ))
}

/// Turns raw lines into events, resolving the delimiter on first use when
/// auto-detection is configured.
///
/// A candidate is locked only by a line that fully parses with it; after
/// that it stays locked for the rest of the run. Before lock-in, a line that
/// splits on some candidate but fails to parse reports that candidate's
/// failure, and a line matching no candidate is reported as
/// [`FailureReason::FormatDetection`].
#[derive(Debug, Clone)]
pub struct LineParser {
    detected: Option<char>,
}

impl LineParser {
    pub fn new(policy: DelimiterPolicy) -> Self {
        let detected = match policy {
            DelimiterPolicy::Fixed(d) => Some(d),
            DelimiterPolicy::Auto => None,
        };
        Self { detected }
    }

    pub fn delimiter(&self) -> Option<char> {
        self.detected
    }

    pub fn parse(&mut self, line: &str) -> Result<LogEvent, ParseFailure> {
        if let Some(d) = self.detected {
            return parse_line(line, d);
        }

        let mut first_failure = None;
        for d in candidate_delimiters(line) {
            match parse_line(line, d) {
                Ok(event) => {
                    tracing::debug!(delimiter = ?d, "delimiter detected");
                    self.detected = Some(d);
                    return Ok(event);
                }
                Err(failure) => {
                    first_failure.get_or_insert(failure);
                }
            }
        }

        Err(first_failure
            .unwrap_or_else(|| ParseFailure::new(line, FailureReason::FormatDetection)))
    }
}
