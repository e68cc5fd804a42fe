use crate::pipeline::types::LogEvent;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Half-open `[start, end)` interval; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| ts >= start) && self.end.is_none_or(|end| ts < end)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// Matched ignoring ASCII case.
    pub event_type: Option<String>,
    pub services: Option<BTreeSet<String>>,
    pub window: TimeWindow,
}

impl FilterSpec {
    pub fn admits(&self, event: &LogEvent) -> bool {
        let type_ok = self
            .event_type
            .as_deref()
            .is_none_or(|t| t.eq_ignore_ascii_case(&event.event_type));

        let service_ok = self
            .services
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&event.service));

        type_ok && service_ok && self.window.contains(event.timestamp)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.event_type.is_none()
            && self.services.is_none()
            && self.window == TimeWindow::default()
    }
}
