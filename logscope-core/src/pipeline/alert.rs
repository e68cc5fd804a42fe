use crate::pipeline::aggregation::{DerivedStats, StatsSnapshot};
use crate::pipeline::constants::{DEFAULT_ERROR_RATE_THRESHOLD, DEFAULT_LATENCY_THRESHOLD_MS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which stats an evaluation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AlertScope {
    Overall,
    PerService,
    #[default]
    All,
}

impl AlertScope {
    fn includes_overall(self) -> bool {
        matches!(self, AlertScope::Overall | AlertScope::All)
    }

    fn includes_services(self) -> bool {
        matches!(self, AlertScope::PerService | AlertScope::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub error_rate_percent: f64,
    pub latency_ms: f64,
    pub scope: AlertScope,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_rate_percent: DEFAULT_ERROR_RATE_THRESHOLD,
            latency_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            scope: AlertScope::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    ErrorRate,
    Latency,
}

impl fmt::Display for AlertMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMetric::ErrorRate => f.write_str("error_rate"),
            AlertMetric::Latency => f.write_str("latency"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTarget {
    Overall,
    Service(String),
}

impl fmt::Display for AlertTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertTarget::Overall => f.write_str("overall"),
            AlertTarget::Service(name) => write!(f, "service:{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub scope: AlertTarget,
    pub metric: AlertMetric,
    pub observed: f64,
    pub threshold: f64,
}

/// Receives alerts raised while a stream is still running.
pub trait AlertHandler {
    fn on_alerts(&mut self, alerts: &[Alert]);
}

impl<F> AlertHandler for F
where
    F: FnMut(&[Alert]),
{
    fn on_alerts(&mut self, alerts: &[Alert]) {
        self(alerts)
    }
}

fn check(
    target: &AlertTarget,
    stats: &DerivedStats,
    thresholds: &AlertThresholds,
    out: &mut Vec<Alert>,
) {
    if stats.count == 0 {
        return;
    }

    if stats.error_rate > thresholds.error_rate_percent {
        out.push(Alert {
            scope: target.clone(),
            metric: AlertMetric::ErrorRate,
            observed: stats.error_rate,
            threshold: thresholds.error_rate_percent,
        });
    }

    if stats.average_latency_ms > thresholds.latency_ms {
        out.push(Alert {
            scope: target.clone(),
            metric: AlertMetric::Latency,
            observed: stats.average_latency_ms,
            threshold: thresholds.latency_ms,
        });
    }
}

/// Overall first, then services in snapshot order; error rate before latency.
pub fn evaluate(snapshot: &StatsSnapshot, thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if thresholds.scope.includes_overall() {
        check(&AlertTarget::Overall, &snapshot.overall, thresholds, &mut alerts);
    }

    if thresholds.scope.includes_services() {
        for service in &snapshot.services {
            check(
                &AlertTarget::Service(service.service.clone()),
                &service.stats,
                thresholds,
                &mut alerts,
            );
        }
    }

    alerts
}
