use logscope_core::pipeline::{
    Alert, CancelToken, IterSource, PipelineConfig, RunOutcome, StreamController,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

pub fn fixture_path(file: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(file)
}

/// Runs a fixture log through a fresh controller, collecting any alert
/// batches emitted along the way.
pub fn run_with(file: &str, config: PipelineConfig) -> (RunOutcome, Vec<Vec<Alert>>) {
    let reader = BufReader::new(File::open(fixture_path(file)).unwrap());
    let mut source = IterSource::from_reader(reader);
    let mut controller = StreamController::new(config);
    let mut batches = Vec::new();

    let outcome = controller
        .run(&mut source, &CancelToken::new(), &mut |alerts: &[Alert]| {
            batches.push(alerts.to_vec())
        })
        .unwrap();

    (outcome, batches)
}

pub fn run_fixture(file: &str) -> RunOutcome {
    run_with(file, PipelineConfig::default()).0
}
