//! Wire types for the bridge API.
//!
//! Schemas mirror what the bridge actually sends; unknown fields are
//! tolerated everywhere, and log entries keep their non-standard fields in a
//! flattened map so the console can render them as extra columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A device known to the bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    /// Stable device identifier (typically a MAC-derived string).
    pub id: String,
    /// Last known IP address.
    #[serde(default)]
    pub ip: Option<String>,
    /// Manufacturer model number.
    #[serde(default)]
    pub model_number: Option<String>,
    /// Device category (led_strip, light_bar, ...).
    #[serde(default)]
    pub device_type: Option<String>,
    /// Human-readable name.
    #[serde(default)]
    pub description: Option<String>,
    /// Lighting protocol the bridge speaks to this device.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Whether output to the device is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Manually added (as opposed to discovered).
    #[serde(default)]
    pub manual: bool,
    /// Seen by discovery.
    #[serde(default)]
    pub discovered: bool,
    /// Has at least one channel mapping configured.
    #[serde(default)]
    pub configured: bool,
    /// Currently unreachable.
    #[serde(default)]
    pub offline: bool,
    /// Reachable but not seen recently.
    #[serde(default)]
    pub stale: bool,
    /// Number of addressable LEDs, if known.
    #[serde(default)]
    pub led_count: Option<u32>,
    /// ISO-8601 timestamp of the last sighting.
    #[serde(default)]
    pub last_seen: Option<String>,
    /// ISO-8601 timestamp of the first sighting.
    #[serde(default)]
    pub first_seen: Option<String>,
    /// Number of mappings referencing this device.
    #[serde(default)]
    pub mapping_count: u32,
}

/// A DMX/ArtNet channel mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mapping {
    /// Mapping identifier.
    pub id: u64,
    /// Target device.
    pub device_id: String,
    /// DMX universe the mapping listens on.
    #[serde(default)]
    pub universe: u32,
    /// First channel (1-512).
    #[serde(default = "default_channel")]
    pub channel: u32,
    /// Number of consecutive channels.
    #[serde(default = "default_length")]
    pub length: u32,
    /// `range` or `discrete`.
    #[serde(default)]
    pub mapping_type: Option<String>,
    /// Field names for range mappings (e.g. `["r", "g", "b"]`).
    #[serde(default)]
    pub fields: Vec<String>,
    /// Single field name for discrete mappings.
    #[serde(default)]
    pub field: Option<String>,
}

fn default_channel() -> u32 {
    1
}

fn default_length() -> u32 {
    1
}

/// One log record from the bridge.
///
/// The four standard fields are always present; anything else the bridge
/// attaches (device ids, queue depths, ...) lands in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-8601 timestamp.
    #[serde(default)]
    pub timestamp: String,
    /// Level name (DEBUG, INFO, WARNING, ERROR, CRITICAL).
    #[serde(default)]
    pub level: String,
    /// Logger name.
    #[serde(default)]
    pub logger: String,
    /// Message text.
    #[serde(default)]
    pub message: String,
    /// Non-standard fields, keyed by name. `BTreeMap` keeps display order
    /// deterministic.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Render an extra field's value without JSON string quoting.
    pub fn extra_display(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One page of the paginated `/logs` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogsPage {
    /// Entries on this page.
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    /// Total matching entries across all pages.
    #[serde(default)]
    pub total: usize,
    /// Echoed page size.
    #[serde(default)]
    pub limit: usize,
    /// Echoed offset.
    #[serde(default)]
    pub offset: usize,
}

/// Result of `/logs/search`. Always a single page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    /// Matching entries.
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    /// Number of matches. Some bridge versions name this `total`.
    #[serde(default, alias = "total")]
    pub count: usize,
}

/// Health report from `/health`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Health {
    /// Overall status string (`ok`, `degraded`, ...).
    #[serde(default)]
    pub status: String,
    /// Per-subsystem detail, when the bridge reports it.
    #[serde(default)]
    pub subsystems: BTreeMap<String, SubsystemHealth>,
}

/// Health of one bridge subsystem.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubsystemHealth {
    /// Subsystem status string.
    #[serde(default)]
    pub status: String,
}

/// One event from `/events/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeEvent {
    /// Event name (e.g. `device_discovered`, `mapping_created`). Treated as
    /// an opaque wire string.
    pub event: String,
    /// ISO-8601 timestamp.
    #[serde(default)]
    pub timestamp: String,
    /// Event payload, keyed by field name.
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_collects_extra_fields() {
        let raw = serde_json::json!({
            "timestamp": "2025-12-30T10:00:00Z",
            "level": "INFO",
            "logger": "artnet",
            "message": "packet received",
            "universe": 1,
            "device_id": "AA:BB",
        });
        let entry: LogEntry = serde_json::from_value(raw).unwrap();

        assert_eq!(entry.level, "INFO");
        let keys: Vec<_> = entry.extra.keys().cloned().collect();
        assert_eq!(keys, vec!["device_id".to_string(), "universe".to_string()]);
        assert_eq!(LogEntry::extra_display(&entry.extra["device_id"]), "AA:BB");
        assert_eq!(LogEntry::extra_display(&entry.extra["universe"]), "1");
    }

    #[test]
    fn search_results_accept_total_alias() {
        let with_count: SearchResults = serde_json::from_str(r#"{"logs": [], "count": 4}"#).unwrap();
        assert_eq!(with_count.count, 4);

        let with_total: SearchResults = serde_json::from_str(r#"{"logs": [], "total": 7}"#).unwrap();
        assert_eq!(with_total.count, 7);
    }

    #[test]
    fn device_tolerates_missing_fields() {
        let device: Device = serde_json::from_str(r#"{"id": "X", "unknown_field": true}"#).unwrap();
        assert_eq!(device.id, "X");
        assert!(!device.offline);
        assert!(device.ip.is_none());
    }

    #[test]
    fn mapping_defaults_channel_and_length() {
        let mapping: Mapping =
            serde_json::from_str(r#"{"id": 3, "device_id": "X", "universe": 1}"#).unwrap();
        assert_eq!(mapping.channel, 1);
        assert_eq!(mapping.length, 1);
        assert!(mapping.fields.is_empty());
    }
}
