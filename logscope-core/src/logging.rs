use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, fmt};

/// Diagnostic log format on stderr. Reports always go to stdout or the
/// output file, so logs never mix with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

pub fn default_log_format() -> LogFormat {
    if io::stderr().is_terminal() {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

/// Install the global subscriber.
///
/// - Level filtering comes from `RUST_LOG` and defaults to "info"
/// - JSON output flattens event fields for line-oriented collectors
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);

    match format {
        LogFormat::Json => builder.json().flatten_event(true).init(),
        LogFormat::Pretty => builder.with_target(false).init(),
    }
}
