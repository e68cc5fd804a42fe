use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending setting, e.g. `histogram.boundaries`.
    pub field: String,
    pub message: String,
    pub help: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
}

#[derive(Serialize)]
struct ValidationReportJson<'a> {
    errors: &'a [ValidationIssue],
}

impl ValidationReport {
    pub fn has_violations(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn error(&mut self, field: &str, message: String, help: Option<String>) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message,
            help,
        });
    }

    pub fn render_json(&self) -> String {
        let json = ValidationReportJson {
            errors: &self.errors,
        };
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        for issue in &self.errors {
            out.push_str(&format!("{}: error: {}\n", issue.field, issue.message));
            if let Some(help) = &issue.help {
                out.push_str(&format!("  help: {}\n", help));
            }
        }
        out
    }

    pub fn render_pretty(&self) -> String {
        let mut out = format!(
            "configuration validation failed ({} errors)\n\n",
            self.errors.len()
        );

        for issue in &self.errors {
            out.push_str(&format!("{}\n", issue.field.bold()));
            out.push_str(&format!("  {}: {}\n", "error".red().bold(), issue.message));
            if let Some(help) = &issue.help {
                out.push_str(&format!("  {}: {}\n", "help".cyan(), help));
            }
            out.push('\n');
        }

        out
    }
}

/// Input settings
impl ValidationReport {
    pub fn invalid_delimiter(&mut self, value: &str) {
        self.error(
            "input.delimiter",
            format!("invalid delimiter: {value:?}"),
            Some("Use \"auto\", a single character, or one of comma, tab, pipe.".to_string()),
        );
    }

    pub fn empty_error_label(&mut self) {
        self.error("input.error_label", "error label must not be empty".to_string(), None);
    }
}

/// Filter settings
impl ValidationReport {
    pub fn empty_event_type(&mut self) {
        self.error(
            "filter.event_type",
            "event type filter must not be empty".to_string(),
            None,
        );
    }

    pub fn empty_service_filter(&mut self) {
        self.error(
            "filter.services",
            "service filter must name at least one service".to_string(),
            Some("Remove the setting to include every service.".to_string()),
        );
    }

    pub fn invalid_timestamp(&mut self, field: &str, value: &str) {
        self.error(
            field,
            format!("invalid timestamp: {value:?}"),
            Some("Use an ISO-8601 timestamp such as 2024-01-01T00:00:00Z.".to_string()),
        );
    }

    pub fn empty_time_window(&mut self, since: &str, until: &str) {
        self.error(
            "filter.until",
            format!("until ({until}) must be later than since ({since})"),
            None,
        );
    }
}

/// Alert settings
impl ValidationReport {
    pub fn invalid_threshold(&mut self, field: &str, value: f64) {
        self.error(
            field,
            format!("threshold must be a non-negative number, got {value}"),
            None,
        );
    }

    pub fn invalid_cadence(&mut self, value: &str) {
        self.error(
            "alerts.cadence",
            format!("unknown alert cadence: {value:?}"),
            Some("Use one of end_of_run, every_event, every_events, interval.".to_string()),
        );
    }

    pub fn missing_cadence_setting(&mut self, cadence: &str, field: &str) {
        self.error(
            field,
            format!("cadence {cadence} requires a positive {field}"),
            None,
        );
    }
}

/// Histogram settings
impl ValidationReport {
    pub fn empty_boundaries(&mut self) {
        self.error(
            "histogram.boundaries",
            "at least one bucket boundary is required".to_string(),
            None,
        );
    }

    pub fn non_finite_boundary(&mut self, value: f64) {
        self.error(
            "histogram.boundaries",
            format!("bucket boundary must be finite, got {value}"),
            None,
        );
    }

    pub fn unsorted_boundaries(&mut self, previous: f64, next: f64) {
        self.error(
            "histogram.boundaries",
            format!("boundaries must be strictly ascending: {next} follows {previous}"),
            None,
        );
    }
}
