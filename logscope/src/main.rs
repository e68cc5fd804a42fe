use clap::{Parser, Subcommand};
use logscope_core::cli::{AnalyzeArgs, check, run_analyze};
use logscope_core::logging::{LogFormat, default_log_format, init_logging};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "logscope",
    version,
    about = "Logscope: log metrics analyzer"
)]
struct Cli {
    /// Diagnostic log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a log file or stdin stream (default)
    Analyze(AnalyzeArgs),

    /// Validate a config file and exit
    Check {
        /// Path to the config file
        #[arg(short, long, default_value = "logscope.hcl")]
        config: PathBuf,

        /// Plain error output without colors
        #[arg(long, conflicts_with = "json")]
        plain: bool,

        /// Validation errors as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.log_format.unwrap_or_else(default_log_format));

    let result = match cli.command {
        Some(Command::Analyze(args)) => run_analyze(args),
        Some(Command::Check {
            config,
            plain,
            json,
        }) => check(&config, plain, json),
        None => run_analyze(AnalyzeArgs::default()),
    };

    if let Err(e) = result {
        eprintln!("logscope error: {e:#}");
        std::process::exit(1);
    }
}
