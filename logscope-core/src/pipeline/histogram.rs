use crate::pipeline::types::LogEvent;
use ahash::RandomState;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub range: String,
    /// `None` for the underflow bucket.
    pub lower_ms: Option<f64>,
    /// `None` for the overflow bucket.
    pub upper_ms: Option<f64>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHistogram {
    pub service: String,
    pub buckets: Vec<BucketCount>,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

/// Counts over `(-inf, b0), [b0, b1), ..., [bk, +inf)`.
#[derive(Debug, Clone)]
pub struct Histogram {
    boundaries: Arc<[f64]>,
    counts: Vec<u64>,
}

impl Histogram {
    pub(crate) fn new(boundaries: Arc<[f64]>) -> Self {
        Self {
            counts: vec![0; boundaries.len() + 1], // underflow + one per boundary
            boundaries,
        }
    }

    /// A value equal to a boundary lands in the bucket starting at it.
    pub(crate) fn bucket_index(&self, value: f64) -> usize {
        self.boundaries.partition_point(|b| *b <= value)
    }

    pub(crate) fn record(&mut self, value: f64) {
        let i = self.bucket_index(value);
        self.counts[i] += 1;
    }

    pub(crate) fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    fn bounds(&self, i: usize) -> (Option<f64>, Option<f64>) {
        let lower = i.checked_sub(1).map(|j| self.boundaries[j]);
        let upper = self.boundaries.get(i).copied();
        (lower, upper)
    }

    pub(crate) fn snapshot(&self) -> Vec<BucketCount> {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, count)| {
                let (lower_ms, upper_ms) = self.bounds(i);
                let range = match (lower_ms, upper_ms) {
                    (None, Some(upper)) => format!("<{upper}ms"),
                    (Some(lower), Some(upper)) => format!("{lower}–{upper}ms"),
                    (Some(lower), None) => format!(">={lower}ms"),
                    (None, None) => "all".to_string(),
                };
                BucketCount {
                    range,
                    lower_ms,
                    upper_ms,
                    count: *count,
                }
            })
            .collect()
    }
}

/// Upper bound of the bucket holding the `pct` quantile.
///
/// Samples in the overflow bucket report its lower bound, and samples in the
/// underflow bucket report the first boundary.
pub fn percentile_from_histogram(buckets: &[BucketCount], total: u64, pct: f64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let target = (total as f64 * pct).ceil() as u64;
    let mut running = 0;

    for bucket in buckets {
        running += bucket.count;
        if running >= target {
            return bucket.upper_ms.or(bucket.lower_ms).unwrap_or(0.0);
        }
    }

    0.0
}

/// Per-service latency histograms over one shared boundary list.
pub struct HistogramBucketer {
    boundaries: Arc<[f64]>,
    per_service: HashMap<String, Histogram, RandomState>,
}

impl HistogramBucketer {
    pub fn new(boundaries: Arc<[f64]>) -> Self {
        Self {
            boundaries,
            per_service: HashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn classify(&mut self, event: &LogEvent) {
        match self.per_service.get_mut(&event.service) {
            Some(h) => h.record(event.latency_ms),
            None => {
                let mut h = Histogram::new(Arc::clone(&self.boundaries));
                h.record(event.latency_ms);
                self.per_service.insert(event.service.clone(), h);
            }
        }
    }

    pub fn service(&self, service: &str) -> Option<ServiceHistogram> {
        self.per_service
            .get(service)
            .map(|h| Self::summarize(service, h))
    }

    /// Sorted by service name.
    pub fn snapshot(&self) -> Vec<ServiceHistogram> {
        let mut out: Vec<ServiceHistogram> = self
            .per_service
            .iter()
            .map(|(service, h)| Self::summarize(service, h))
            .collect();
        out.sort_by(|a, b| a.service.cmp(&b.service));
        out
    }

    fn summarize(service: &str, h: &Histogram) -> ServiceHistogram {
        let buckets = h.snapshot();
        let total = h.total();
        ServiceHistogram {
            service: service.to_string(),
            p95_ms: percentile_from_histogram(&buckets, total, 0.95),
            p99_ms: percentile_from_histogram(&buckets, total, 0.99),
            buckets,
        }
    }
}
