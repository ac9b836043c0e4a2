//! Log tail controller state.
//!
//! Owns the scrollback for the `/logs/stream` view. The network side lives
//! in the runtime's stream task; decoded entries arrive here, get formatted
//! into display lines, and queue until the batch tick flushes them into the
//! buffer in one append.

use luxlink_client::LogEntry;

use crate::{
    buffer::OutputBuffer,
    format::table_timestamp,
    stream::{ConnectionState, PendingLines},
};

/// Indent for wrapped extra-field continuation lines.
const CONTINUATION_INDENT: &str = "      ";

/// State of the live log tail view.
#[derive(Debug, Clone, Default)]
pub struct LogTailState {
    /// Stream connection state, as last reported by the stream task.
    pub connection: ConnectionState,
    /// Level filter sent to the bridge.
    pub level_filter: Option<String>,
    /// Logger name filter sent to the bridge.
    pub logger_filter: Option<String>,
    /// Lines awaiting the next batch flush.
    pub pending: PendingLines,
    /// Scrollback for this view.
    pub buffer: OutputBuffer,
}

impl LogTailState {
    /// Create tail state with the given initial filters.
    pub fn new(level: Option<String>, logger: Option<String>) -> Self {
        Self { level_filter: level, logger_filter: logger, ..Self::default() }
    }

    /// Filter message for the live socket. `{}` clears server-side filters.
    pub fn filter_message(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        if let Some(level) = &self.level_filter {
            obj.insert("level".to_string(), serde_json::Value::String(level.clone()));
        }
        if let Some(logger) = &self.logger_filter {
            obj.insert("logger".to_string(), serde_json::Value::String(logger.clone()));
        }
        serde_json::Value::Object(obj)
    }

    /// Initial payload for a fresh connection: only sent when a filter is
    /// actually set.
    pub fn initial_payload(&self) -> Option<serde_json::Value> {
        if self.level_filter.is_none() && self.logger_filter.is_none() {
            return None;
        }
        Some(self.filter_message())
    }

    /// Cycle the level filter: ALL → INFO → WARNING → ERROR → CRITICAL →
    /// ALL. Returns the filter message to push to the stream task.
    pub fn cycle_level_filter(&mut self) -> serde_json::Value {
        self.level_filter = match self.level_filter.as_deref() {
            None => Some("INFO".to_string()),
            Some("INFO") => Some("WARNING".to_string()),
            Some("WARNING") => Some("ERROR".to_string()),
            Some("ERROR") => Some("CRITICAL".to_string()),
            Some(_) => None,
        };
        self.filter_message()
    }

    /// Clear both filters. Returns the (empty) filter message to push.
    pub fn clear_filters(&mut self) -> serde_json::Value {
        self.level_filter = None;
        self.logger_filter = None;
        self.filter_message()
    }

    /// Format a decoded entry and queue it for the next flush.
    pub fn push_entry(&mut self, entry: &LogEntry, width: usize) {
        self.pending.push(format_tail_line(entry, width));
    }

    /// Flush queued lines into the buffer. Returns `true` when a redraw is
    /// needed.
    pub fn flush(&mut self) -> bool {
        self.pending.flush_into(&mut self.buffer)
    }

    /// Toggle follow-tail; enabling jumps to the newest line.
    pub fn toggle_follow(&mut self) -> bool {
        let follow = !self.buffer.follow_tail();
        self.buffer.set_follow_tail(follow);
        follow
    }
}

/// One display line per entry, with extra fields on indented continuation
/// lines wrapped to the terminal width.
pub fn format_tail_line(entry: &LogEntry, width: usize) -> String {
    let mut line = format!(
        "{} {:<8} {}: {}\n",
        table_timestamp(&entry.timestamp),
        entry.level,
        entry.logger,
        entry.message
    );

    if !entry.extra.is_empty() {
        let pairs: Vec<String> = entry
            .extra
            .iter()
            .map(|(key, value)| format!("{key}={}", LogEntry::extra_display(value)))
            .collect();
        let wrap_width = width.saturating_sub(CONTINUATION_INDENT.len()).max(16);
        for wrapped in crate::format::word_wrap(&pairs.join(" "), wrap_width) {
            line.push_str(CONTINUATION_INDENT);
            line.push_str(&wrapped);
            line.push('\n');
        }
    }
    line
}
