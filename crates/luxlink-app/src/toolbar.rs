//! Two-line status toolbar.
//!
//! The toolbar is pure presentation: it derives styled text fragments from
//! whatever the controllers currently hold, plus a lazily refreshed
//! health/device-count snapshot. Fetch errors never surface here — a stale
//! toolbar beats a blocked one.

use std::time::{Duration, Instant};

use luxlink_client::Device;

use crate::{format::fit_with_ellipsis, mode::ShellMode, stream::ConnectionState};

/// Minimum age before the status snapshot is refreshed again.
pub const STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Style class of a toolbar fragment; the terminal layer maps these to
/// colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarTag {
    /// Dim separator/info text.
    Info,
    /// Healthy/connected green.
    Good,
    /// Degraded/reconnecting yellow.
    Degraded,
    /// Disconnected/offline red.
    Bad,
    /// Unconfigured-count highlight.
    Attention,
}

/// One styled run of toolbar text.
pub type Fragment = (ToolbarTag, String);

/// Lazily refreshed health/device snapshot backing toolbar line 1.
#[derive(Debug, Clone, Default)]
pub struct ToolbarStatus {
    /// Devices online, configured, and enabled.
    pub active_devices: usize,
    /// Devices online but missing configuration.
    pub unconfigured_devices: usize,
    /// Enabled devices currently offline.
    pub offline_devices: usize,
    /// Bridge health string (`ok`, `degraded`, `unknown`).
    pub health_status: String,
    /// When the snapshot was last refreshed.
    pub last_update: Option<Instant>,
}

impl ToolbarStatus {
    /// Fresh snapshot with unknown health.
    pub fn new() -> Self {
        Self { health_status: "unknown".to_string(), ..Self::default() }
    }

    /// Whether the snapshot is due for a refresh.
    pub fn is_stale(&self, now: Instant) -> bool {
        self.last_update.is_none_or(|at| now.duration_since(at) >= STATUS_REFRESH_INTERVAL)
    }

    /// Update device counts from a `/devices` response.
    pub fn apply_devices(&mut self, devices: &[Device]) {
        self.active_devices =
            devices.iter().filter(|d| d.enabled && d.configured && !d.offline).count();
        self.unconfigured_devices = devices.iter().filter(|d| !d.configured && !d.offline).count();
        self.offline_devices = devices.iter().filter(|d| d.enabled && d.offline).count();
    }

    /// Update the health string.
    pub fn apply_health(&mut self, status: String) {
        self.health_status = status;
    }

    /// Mark the snapshot as refreshed at `now`.
    pub fn mark_updated(&mut self, now: Instant) {
        self.last_update = Some(now);
    }
}

fn connection_fragment(state: ConnectionState) -> Fragment {
    match state {
        ConnectionState::Connected => (ToolbarTag::Good, "● Connected".to_string()),
        ConnectionState::Connecting => (ToolbarTag::Info, "○ Connecting".to_string()),
        ConnectionState::Reconnecting => (ToolbarTag::Degraded, "◐ Reconnecting".to_string()),
        ConnectionState::Disconnected => (ToolbarTag::Bad, "○ Disconnected".to_string()),
    }
}

/// Line 1: API connectivity, optional events-stream state, device counts.
pub fn line1(
    api_connected: bool,
    events_stream: Option<ConnectionState>,
    status: &ToolbarStatus,
) -> Vec<Fragment> {
    let mut parts: Vec<Fragment> = Vec::new();

    if api_connected {
        parts.push((ToolbarTag::Good, "● API Connected".to_string()));
    } else {
        parts.push((ToolbarTag::Bad, "○ API Disconnected".to_string()));
    }

    if let Some(state) = events_stream {
        parts.push((ToolbarTag::Info, " | Events: ".to_string()));
        parts.push(connection_fragment(state));
    }

    parts.push((ToolbarTag::Info, " │ Devices: Active ".to_string()));
    parts.push((ToolbarTag::Good, status.active_devices.to_string()));
    parts.push((ToolbarTag::Info, " | Unconfigured ".to_string()));
    parts.push((ToolbarTag::Attention, status.unconfigured_devices.to_string()));
    parts.push((ToolbarTag::Info, " | Offline ".to_string()));
    parts.push((ToolbarTag::Bad, status.offline_devices.to_string()));

    parts
}

/// Line 2: normal health/server/age info, or the active mode's own summary.
pub fn line2(
    mode: &ShellMode,
    status: &ToolbarStatus,
    server_url: &str,
    now: Instant,
) -> Vec<Fragment> {
    match mode {
        ShellMode::LogView(view) => {
            let mut parts: Vec<Fragment> = Vec::new();
            let page = view.current_page + 1;
            parts.push((
                ToolbarTag::Info,
                format!("Logs View: Page {page}/{}", view.total_pages.max(1)),
            ));
            let level = view.level_filter.map_or("ALL", |l| l.as_str());
            parts.push((ToolbarTag::Info, format!(" │ Level: {level}")));
            if let Some(logger) = &view.logger_filter {
                parts.push((ToolbarTag::Info, format!(" │ Logger: {}", fit_with_ellipsis(logger, 20))));
            }
            if let Some(pattern) = &view.search_pattern {
                let regex_marker = if view.search_regex { " (regex)" } else { "" };
                parts.push((
                    ToolbarTag::Info,
                    format!(" │ Search: \"{}\"{regex_marker}", fit_with_ellipsis(pattern, 20)),
                ));
            }
            if view.follow_mode {
                parts.push((ToolbarTag::Info, " │ Follow: ".to_string()));
                parts.push((ToolbarTag::Good, "ON".to_string()));
            }
            if let Some(error) = &view.error {
                parts.push((ToolbarTag::Info, " │ ".to_string()));
                parts.push((ToolbarTag::Degraded, format!("⚠ {}", fit_with_ellipsis(error, 24))));
            }
            parts
        },
        ShellMode::LogTail(tail) => {
            let mut parts: Vec<Fragment> =
                vec![(ToolbarTag::Info, "Log Tail: ".to_string()), connection_fragment(tail.connection)];

            if tail.level_filter.is_some() || tail.logger_filter.is_some() {
                parts.push((ToolbarTag::Info, " │ Filters: ".to_string()));
                let mut filters = Vec::new();
                if let Some(level) = &tail.level_filter {
                    filters.push(format!("Level={level}"));
                }
                if let Some(logger) = &tail.logger_filter {
                    filters.push(format!("Logger={logger}"));
                }
                parts.push((ToolbarTag::Info, filters.join(", ")));
            } else {
                parts.push((ToolbarTag::Info, " │ Filters: None".to_string()));
            }

            let (tag, label) = if tail.buffer.follow_tail() {
                (ToolbarTag::Good, "ON")
            } else {
                (ToolbarTag::Degraded, "OFF")
            };
            parts.push((ToolbarTag::Info, " │ Follow: ".to_string()));
            parts.push((tag, label.to_string()));
            parts
        },
        ShellMode::Events(events) => {
            let mut parts: Vec<Fragment> =
                vec![(ToolbarTag::Info, "Events: ".to_string()), connection_fragment(events.connection)];
            if let Some(filter) = events.kind_filter {
                parts.push((ToolbarTag::Info, format!(" │ Type: {}", filter.prefix())));
            }
            parts
        },
        ShellMode::Watch(watch) => {
            vec![(
                ToolbarTag::Info,
                format!(
                    "Watch: {} │ Interval: {:.1}s │ +/- adjust, q exits",
                    watch.target.as_str(),
                    watch.interval.as_secs_f64()
                ),
            )]
        },
        ShellMode::Normal => {
            let (tag, icon) = match status.health_status.as_str() {
                "ok" => (ToolbarTag::Good, "✓"),
                "degraded" => (ToolbarTag::Degraded, "⚠"),
                _ => (ToolbarTag::Info, "?"),
            };
            let age = status.last_update.map_or_else(
                || "n/a".to_string(),
                |at| format!("{}s ago", now.duration_since(at).as_secs()),
            );
            vec![
                (ToolbarTag::Info, "Health: ".to_string()),
                (tag, format!("{icon} {}", status.health_status)),
                (ToolbarTag::Info, format!(" │ Server: {server_url} │ Updated: {age}")),
            ]
        },
    }
}

/// Truncate a fragment line to `width` characters (ellipsis on overflow) and
/// pad the remainder with spaces. Never wraps.
pub fn fit_line(fragments: Vec<Fragment>, width: usize) -> Vec<Fragment> {
    let mut out: Vec<Fragment> = Vec::new();
    let mut used = 0usize;

    for (tag, text) in fragments {
        if used >= width {
            break;
        }
        let remaining = width - used;
        let chars = text.chars().count();
        if chars <= remaining {
            used += chars;
            out.push((tag, text));
        } else {
            out.push((tag, fit_with_ellipsis(&text, remaining)));
            used = width;
        }
    }

    if used < width {
        out.push((ToolbarTag::Info, " ".repeat(width - used)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{format::LogLevel, view::LogViewState};

    fn device(enabled: bool, configured: bool, offline: bool) -> Device {
        Device { id: "d".to_string(), enabled, configured, offline, ..Device::default() }
    }

    #[test]
    fn device_counting_rules() {
        let devices = vec![
            device(true, true, false),   // active
            device(true, false, false),  // unconfigured
            device(false, false, false), // unconfigured (enabled irrelevant)
            device(true, true, true),    // offline
            device(false, true, true),   // disabled + offline: counted nowhere
        ];
        let mut status = ToolbarStatus::new();
        status.apply_devices(&devices);
        assert_eq!(status.active_devices, 1);
        assert_eq!(status.unconfigured_devices, 2);
        assert_eq!(status.offline_devices, 1);
    }

    #[test]
    fn staleness_window() {
        let mut status = ToolbarStatus::new();
        let now = Instant::now();
        assert!(status.is_stale(now));
        status.mark_updated(now);
        assert!(!status.is_stale(now));
        assert!(status.is_stale(now + Duration::from_secs(6)));
    }

    #[test]
    fn line1_reflects_events_stream_state() {
        let status = ToolbarStatus::new();
        let fragments = line1(true, Some(ConnectionState::Reconnecting), &status);
        let text: String = fragments.iter().map(|(_, t)| t.as_str()).collect();
        assert!(text.contains("● API Connected"));
        assert!(text.contains("Events: ◐ Reconnecting"));
        assert!(text.contains("Devices: Active 0"));
    }

    #[test]
    fn line2_shows_log_view_summary() {
        let mut view = LogViewState::new(Some(LogLevel::Error), Some("sender".to_string()), None);
        view.total_pages = 4;
        view.current_page = 3;
        view.follow_mode = true;
        let mode = ShellMode::LogView(view);

        let fragments = line2(&mode, &ToolbarStatus::new(), "http://x", Instant::now());
        let text: String = fragments.iter().map(|(_, t)| t.as_str()).collect();
        assert!(text.contains("Page 4/4"));
        assert!(text.contains("Level: ERROR"));
        assert!(text.contains("Logger: sender"));
        assert!(text.contains("Follow: ON"));
    }

    #[test]
    fn line2_normal_shows_health_and_server() {
        let mut status = ToolbarStatus::new();
        status.apply_health("ok".to_string());
        let now = Instant::now();
        status.mark_updated(now);

        let fragments = line2(&ShellMode::Normal, &status, "http://bridge:8000", now);
        let text: String = fragments.iter().map(|(_, t)| t.as_str()).collect();
        assert!(text.contains("✓ ok"));
        assert!(text.contains("Server: http://bridge:8000"));
        assert!(text.contains("Updated: 0s ago"));
    }

    #[test]
    fn fit_line_truncates_and_pads() {
        let fragments = vec![
            (ToolbarTag::Info, "0123456789".to_string()),
            (ToolbarTag::Good, "abcdefgh".to_string()),
        ];
        let fitted = fit_line(fragments.clone(), 14);
        let text: String = fitted.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(text.chars().count(), 14);
        assert!(text.ends_with('…'));

        let padded = fit_line(fragments, 30);
        let text: String = padded.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(text.chars().count(), 30);
        assert!(text.ends_with(' '));
    }
}
