//! Event stream view state.
//!
//! Mirrors the log tail: one reconnecting stream bound to `/events/stream`,
//! batched line flushes, bounded scrollback. Event names are opaque wire
//! strings; the optional kind filter matches on their prefix only.

use std::str::FromStr;

use luxlink_client::{BridgeEvent, LogEntry};

use crate::{
    buffer::OutputBuffer,
    format::table_timestamp,
    stream::{ConnectionState, PendingLines},
};

/// Client-side event category filter, matched against the event name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKindFilter {
    /// `device_*` events.
    Device,
    /// `mapping_*` events.
    Mapping,
    /// `health_*` events.
    Health,
}

impl EventKindFilter {
    /// Name prefix this filter matches.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Mapping => "mapping",
            Self::Health => "health",
        }
    }
}

impl FromStr for EventKindFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "device" => Ok(Self::Device),
            "mapping" => Ok(Self::Mapping),
            "health" => Ok(Self::Health),
            _ => Err(()),
        }
    }
}

/// State of the live event stream view.
#[derive(Debug, Clone, Default)]
pub struct EventsState {
    /// Stream connection state, as last reported by the stream task.
    pub connection: ConnectionState,
    /// Optional client-side kind filter.
    pub kind_filter: Option<EventKindFilter>,
    /// Lines awaiting the next batch flush.
    pub pending: PendingLines,
    /// Scrollback for this view.
    pub buffer: OutputBuffer,
}

impl EventsState {
    /// Create events state with an optional kind filter.
    pub fn new(kind_filter: Option<EventKindFilter>) -> Self {
        Self { kind_filter, ..Self::default() }
    }

    /// Queue a decoded event, unless the kind filter rejects it.
    pub fn push_event(&mut self, event: &BridgeEvent) {
        if let Some(filter) = self.kind_filter
            && !event.event.starts_with(filter.prefix())
        {
            return;
        }
        self.pending.push(format_event_line(event));
    }

    /// Flush queued lines into the buffer. Returns `true` when a redraw is
    /// needed.
    pub fn flush(&mut self) -> bool {
        self.pending.flush_into(&mut self.buffer)
    }
}

/// `Jan 15 14:35:42  device_discovered  id=AA:BB ip=10.0.0.9`
pub fn format_event_line(event: &BridgeEvent) -> String {
    let mut line = format!("{}  {:<24}", table_timestamp(&event.timestamp), event.event);
    for (key, value) in &event.data {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        line.push_str(&LogEntry::extra_display(value));
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn event(name: &str) -> BridgeEvent {
        let mut data = BTreeMap::new();
        data.insert("device_id".to_string(), serde_json::json!("AA:BB"));
        BridgeEvent {
            event: name.to_string(),
            timestamp: "2025-01-15T14:35:42Z".to_string(),
            data,
        }
    }

    #[test]
    fn formats_event_with_sorted_data_pairs() {
        let mut e = event("device_discovered");
        e.data.insert("ip".to_string(), serde_json::json!("10.0.0.9"));
        let line = format_event_line(&e);
        assert!(line.starts_with("Jan 15 14:35:42  device_discovered"));
        let id_at = line.find("device_id=").map_or(usize::MAX, |i| i);
        let ip_at = line.find("ip=").map_or(0, |i| i);
        assert!(id_at < ip_at, "data pairs render in sorted key order");
    }

    #[test]
    fn kind_filter_matches_prefix() {
        let mut events = EventsState::new(Some(EventKindFilter::Device));
        events.push_event(&event("device_offline"));
        events.push_event(&event("mapping_created"));
        events.flush();
        assert_eq!(events.buffer.text().lines().count(), 1);
        assert!(events.buffer.text().contains("device_offline"));
    }

    #[test]
    fn no_filter_passes_everything() {
        let mut events = EventsState::new(None);
        events.push_event(&event("device_offline"));
        events.push_event(&event("health_status_changed"));
        events.flush();
        assert_eq!(events.buffer.text().lines().count(), 2);
    }
}
