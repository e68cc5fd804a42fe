use crate::conf::{ConfigError, load_config};
use crate::pipeline::{DelimiterPolicy, PipelineConfig};
use std::path::Path;

pub fn check(path: &Path, plain: bool, json: bool) -> anyhow::Result<()> {
    match load_config(path, false) {
        Ok(cfg) => {
            print_summary(&cfg);
            Ok(())
        }
        Err(err) => {
            print_config_error(&err, plain, json);
            std::process::exit(1);
        }
    }
}

fn print_summary(cfg: &PipelineConfig) {
    let delimiter = match cfg.delimiter {
        DelimiterPolicy::Auto => "auto".to_string(),
        DelimiterPolicy::Fixed(c) => format!("{:?}", c),
    };

    println!("✔ Config loaded successfully");
    println!("✔ delimiter: {}", delimiter);
    println!("✔ error label: {}", cfg.error_label);
    println!(
        "✔ thresholds: error rate {}%, latency {}ms ({:?})",
        cfg.thresholds.error_rate_percent, cfg.thresholds.latency_ms, cfg.thresholds.scope
    );
    println!("✔ {} histogram boundaries", cfg.histogram_boundaries.len());
    println!("✔ top {} slowest per service", cfg.top_n);
    if !cfg.filter.is_unrestricted() {
        println!("✔ filter active");
    }
}

pub(crate) fn print_config_error(err: &ConfigError, plain: bool, json: bool) {
    if let ConfigError::Validation { report } = err {
        if json {
            println!("{}", report.render_json());
        } else if plain {
            eprint!("{}", report.render_plain());
        } else {
            eprintln!();
            eprint!("{}", report.render_pretty());
        }
        return;
    }

    eprintln!("{}", err);
    if let Some(hint) = config_error_hint(err) {
        eprintln!();
        eprintln!("{}", hint);
    }
}

pub fn config_error_hint(err: &ConfigError) -> Option<&'static str> {
    match err {
        ConfigError::ReadFile { .. } => Some(
            "Check the path passed to --config.\n\
             \n\
             The file is optional; omit --config to run with built-in defaults.",
        ),

        ConfigError::Parse { .. } => Some(
            "Settings are grouped into blocks. Unknown attributes are rejected.\n\
             \n\
             Example:\n\
             \n\
             input {\n  \
               delimiter = \"auto\"\n\
             }\n\
             \n\
             alerts {\n  \
               error_rate_percent = 20\n  \
               latency_ms         = 100\n\
             }",
        ),

        ConfigError::Validation { .. } => None,
    }
}
