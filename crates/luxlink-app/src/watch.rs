//! Watch mode state.
//!
//! Watch mode re-runs one of the monitoring renderers on a timer and shows
//! the result in its own overlay buffer. Renderers return their output as a
//! value, so the main output buffer is never touched while watch mode is
//! active.

use std::{str::FromStr, time::Duration};

use chrono::{DateTime, Local};

use crate::buffer::OutputBuffer;

/// Smallest allowed refresh interval; prevents hammering the bridge.
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Default refresh interval.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Step used by the `+`/`-` interval keys.
const INTERVAL_STEP: Duration = Duration::from_millis(500);

/// What a watch session renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchTarget {
    /// Device table.
    Devices,
    /// Mapping table.
    Mappings,
    /// Health + device dashboard.
    Dashboard,
    /// Recent log entries.
    Logs,
}

impl WatchTarget {
    /// Display name (upper-cased in the header).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Mappings => "mappings",
            Self::Dashboard => "dashboard",
            Self::Logs => "logs",
        }
    }
}

impl FromStr for WatchTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "devices" => Ok(Self::Devices),
            "mappings" => Ok(Self::Mappings),
            "dashboard" => Ok(Self::Dashboard),
            "logs" => Ok(Self::Logs),
            _ => Err(()),
        }
    }
}

/// State of an active watch session.
#[derive(Debug, Clone)]
pub struct WatchState {
    /// Target being watched.
    pub target: WatchTarget,
    /// Refresh interval (floored at [`MIN_WATCH_INTERVAL`]).
    pub interval: Duration,
    /// Overlay buffer the rendered output lands in.
    pub buffer: OutputBuffer,
}

impl WatchState {
    /// Create watch state for `target`.
    pub fn new(target: WatchTarget, interval: Option<Duration>) -> Self {
        Self {
            target,
            interval: clamp_interval(interval.unwrap_or(DEFAULT_WATCH_INTERVAL)),
            buffer: OutputBuffer::new(),
        }
    }

    /// Set the interval; takes effect on the watch task's next sleep.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = clamp_interval(interval);
    }

    /// Shorten the interval by one step (`+` key: faster refresh).
    pub fn faster(&mut self) -> Duration {
        self.set_interval(self.interval.saturating_sub(INTERVAL_STEP));
        self.interval
    }

    /// Lengthen the interval by one step (`-` key: slower refresh).
    pub fn slower(&mut self) -> Duration {
        self.set_interval(self.interval + INTERVAL_STEP);
        self.interval
    }

    /// Replace the overlay with freshly rendered output.
    pub fn show(&mut self, rendered: String) {
        self.buffer.set(rendered, 0);
    }
}

fn clamp_interval(interval: Duration) -> Duration {
    interval.max(MIN_WATCH_INTERVAL)
}

/// Boxed header rendered above each refresh.
pub fn watch_header(target: WatchTarget, refreshed_at: DateTime<Local>) -> String {
    let title = target.as_str().to_ascii_uppercase();
    let stamp = refreshed_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let mut out = String::new();
    out.push_str("╔═══════════════════════════════════════════════════════════╗\n");
    out.push_str(&format!("║  Watch Mode - {title:<44}║\n"));
    out.push_str(&format!("║  Refreshed at {stamp:<44}║\n"));
    out.push_str("╚═══════════════════════════════════════════════════════════╝\n\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse_by_name() {
        assert_eq!("devices".parse::<WatchTarget>(), Ok(WatchTarget::Devices));
        assert_eq!("DASHBOARD".parse::<WatchTarget>(), Ok(WatchTarget::Dashboard));
        assert!("channels".parse::<WatchTarget>().is_err());
    }

    #[test]
    fn interval_floor_is_enforced() {
        let mut watch = WatchState::new(WatchTarget::Devices, Some(Duration::from_millis(100)));
        assert_eq!(watch.interval, MIN_WATCH_INTERVAL);

        watch.set_interval(Duration::from_secs(2));
        watch.faster();
        watch.faster();
        watch.faster();
        watch.faster();
        assert_eq!(watch.interval, MIN_WATCH_INTERVAL);

        watch.slower();
        assert_eq!(watch.interval, Duration::from_secs(1));
    }

    #[test]
    fn show_replaces_overlay_content() {
        let mut watch = WatchState::new(WatchTarget::Logs, None);
        watch.show("first\n".to_string());
        watch.show("second\n".to_string());
        assert_eq!(watch.buffer.text(), "second\n");
        assert_eq!(watch.buffer.cursor(), 0);
    }

    #[test]
    fn header_contains_target_and_timestamp() {
        let stamp = chrono::Local::now();
        let header = watch_header(WatchTarget::Mappings, stamp);
        assert!(header.contains("MAPPINGS"));
        assert!(header.contains("Refreshed at"));
    }
}
