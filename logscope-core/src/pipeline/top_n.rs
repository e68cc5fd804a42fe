use crate::pipeline::types::LogEvent;
use ahash::RandomState;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TopNEntry {
    /// Arrival position among offered events.
    pub sequence: u64,
    pub event: LogEvent,
}

impl TopNEntry {
    pub fn latency_ms(&self) -> f64 {
        self.event.latency_ms
    }
}

/// Keeps the `limit` slowest events per service.
///
/// Entries are ordered by descending latency, then by arrival. A full list
/// only accepts a newcomer that is strictly slower than its last entry, so on
/// equal latency the earlier event is kept.
pub struct TopNTracker {
    limit: usize,
    per_service: HashMap<String, Vec<TopNEntry>, RandomState>,
    next_sequence: u64,
}

impl TopNTracker {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            per_service: HashMap::with_hasher(RandomState::new()),
            next_sequence: 0,
        }
    }

    pub fn offer(&mut self, event: &LogEvent) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.limit == 0 {
            return;
        }

        let entries = self
            .per_service
            .entry(event.service.clone())
            .or_default();

        // Everything already held at the same latency arrived earlier.
        let position = entries.partition_point(|e| e.latency_ms() >= event.latency_ms);
        if position >= self.limit {
            return;
        }

        if entries.len() == self.limit {
            entries.pop();
        }
        entries.insert(
            position,
            TopNEntry {
                sequence,
                event: event.clone(),
            },
        );
    }

    pub fn snapshot(&self, service: &str) -> &[TopNEntry] {
        self.per_service
            .get(service)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
