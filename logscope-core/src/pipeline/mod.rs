//! Log Metrics Pipeline
//!
//! This module turns a stream of delimited log lines into per-service metrics.
//!
//! Every line is handled on its own, in the order it arrives: it is parsed into a
//! [`LogEvent`] (or counted as a [`ParseFailure`]), checked against the [`FilterSpec`],
//! and, if admitted, handed to three collectors:
//! - **MetricAggregator**: running counts, latency sums and error counts
//! - **TopNTracker**: the N slowest events per service
//! - **HistogramBucketer**: per-service latency buckets
//!
//! None of the collectors keep the event history, so memory stays bounded by the
//! number of services no matter how long the stream runs. Alerts are computed from
//! an aggregator snapshot, never from raw events.
//!
//! The overall data processing architecture is:
//!
//! LineSource
//! LineParser
//! LogEvent
//! FilterSpec
//! MetricAggregator / TopNTracker / HistogramBucketer
//! Summary + Alert
//!

mod aggregation;
mod alert;
mod constants;
mod controller;
mod filter;
mod histogram;
mod parse;
mod source;
mod summary;
mod top_n;
mod types;

#[cfg(test)]
mod tests;

pub use aggregation::*;
pub use alert::*;
pub use constants::*;
pub use controller::*;
pub use filter::*;
pub use histogram::*;
pub use parse::*;
pub use source::*;
pub use summary::*;
pub use top_n::*;
pub use types::*;
