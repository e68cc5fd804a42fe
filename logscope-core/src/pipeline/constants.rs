use std::time::Duration;

/// timestamp, service, event type, latency
pub const EXPECTED_FIELDS: usize = 4;

/// Auto-detection candidates, in priority order.
pub const DELIMITER_CANDIDATES: &[char] = &[',', '\t', '|'];

pub const DEFAULT_ERROR_LABEL: &str = "ERROR";
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 20.0;
pub const DEFAULT_LATENCY_THRESHOLD_MS: f64 = 100.0;
pub const DEFAULT_LATENCY_BUCKETS_MS: &[f64] =
    &[0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0];

/// How long a streaming pull waits before reporting the source as idle.
pub const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const MAX_FAILURE_SAMPLES: usize = 10;
