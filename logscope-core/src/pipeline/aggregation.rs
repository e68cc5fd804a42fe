use crate::pipeline::types::LogEvent;
use ahash::RandomState;
use serde::Serialize;
use std::collections::HashMap;

/// Neumaier-compensated running sum, so long streams of small latencies do
/// not drift away from the exact total.
#[derive(Debug, Clone, Copy, Default)]
struct RunningSum {
    sum: f64,
    compensation: f64,
}

impl RunningSum {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceStats {
    count: u64,
    latency_sum: RunningSum,
    error_count: u64,
    min_latency: Option<f64>,
    max_latency: Option<f64>,
}

impl ServiceStats {
    fn record(&mut self, latency_ms: f64, is_error: bool) {
        self.count += 1;
        self.latency_sum.add(latency_ms);
        if is_error {
            self.error_count += 1;
        }
        self.min_latency = Some(self.min_latency.map_or(latency_ms, |m| m.min(latency_ms)));
        self.max_latency = Some(self.max_latency.map_or(latency_ms, |m| m.max(latency_ms)));
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn latency_sum(&self) -> f64 {
        self.latency_sum.value()
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn average_latency(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.latency_sum() / self.count as f64
        }
    }

    /// Percentage in `0..=100`.
    pub fn error_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.error_count as f64 / self.count as f64 * 100.0
        }
    }

    fn derive(&self) -> DerivedStats {
        DerivedStats {
            count: self.count,
            error_count: self.error_count,
            average_latency_ms: self.average_latency(),
            error_rate: self.error_rate(),
            min_latency_ms: self.min_latency.unwrap_or(0.0),
            max_latency_ms: self.max_latency.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStats {
    pub count: u64,
    pub error_count: u64,
    pub average_latency_ms: f64,
    pub error_rate: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub service: String,
    #[serde(flatten)]
    pub stats: DerivedStats,
}

/// Read-only view of the aggregator at one point in the stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub overall: DerivedStats,
    /// Sorted by service name.
    pub services: Vec<ServiceSummary>,
}

pub struct MetricAggregator {
    error_label: String,
    services: HashMap<String, ServiceStats, RandomState>,
    overall: ServiceStats,
}

impl MetricAggregator {
    pub fn new(error_label: impl Into<String>) -> Self {
        Self {
            error_label: error_label.into(),
            services: HashMap::with_hasher(RandomState::new()),
            overall: ServiceStats::default(),
        }
    }

    pub fn record(&mut self, event: &LogEvent) {
        let is_error = event.event_type == self.error_label;

        match self.services.get_mut(&event.service) {
            Some(stats) => stats.record(event.latency_ms, is_error),
            None => {
                let mut stats = ServiceStats::default();
                stats.record(event.latency_ms, is_error);
                self.services.insert(event.service.clone(), stats);
            }
        }

        self.overall.record(event.latency_ms, is_error);
    }

    pub fn service(&self, name: &str) -> Option<&ServiceStats> {
        self.services.get(name)
    }

    pub fn overall(&self) -> &ServiceStats {
        &self.overall
    }

    pub fn finalize(&self) -> StatsSnapshot {
        let mut services: Vec<ServiceSummary> = self
            .services
            .iter()
            .map(|(name, stats)| ServiceSummary {
                service: name.clone(),
                stats: stats.derive(),
            })
            .collect();
        services.sort_by(|a, b| a.service.cmp(&b.service));

        StatsSnapshot {
            overall: self.overall.derive(),
            services,
        }
    }
}
