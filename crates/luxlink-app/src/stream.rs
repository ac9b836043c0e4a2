//! Reconnecting-stream primitives.
//!
//! The log tail and the event stream share one connection lifecycle:
//! connect, receive until failure, back off, retry. The pure pieces live
//! here — the state enum, the backoff schedule, and the batching queue that
//! coalesces received lines into one buffer append per UI tick.

use std::{collections::VecDeque, time::Duration};

use crate::buffer::OutputBuffer;

/// Cap on stream scrollback buffers (log tail, events), in characters.
pub const MAX_STREAM_BUFFER_CHARS: usize = 500_000;

/// Interval between batched buffer flushes.
pub const BATCH_INTERVAL: Duration = Duration::from_millis(100);

/// Connection lifecycle of one reconnecting stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and none pending.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Live stream.
    Connected,
    /// Lost the stream; waiting out the backoff delay.
    Reconnecting,
}

impl ConnectionState {
    /// Whether a live socket exists.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// Status label for the toolbar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Reconnecting => "Reconnecting...",
        }
    }
}

/// Exponential reconnect backoff: 1s, 2s, 4s, 8s, then capped at 10s.
/// Reset to the floor after any successful connect.
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
}

impl Backoff {
    const FLOOR: Duration = Duration::from_secs(1);
    const CAP: Duration = Duration::from_secs(10);

    /// Start at the floor delay.
    pub fn new() -> Self {
        Self { delay: Self::FLOOR }
    }

    /// Delay to sleep before the next attempt; doubles (capped) for the one
    /// after.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.delay;
        self.delay = (self.delay * 2).min(Self::CAP);
        current
    }

    /// Reset to the floor after a successful connect.
    pub fn reset(&mut self) {
        self.delay = Self::FLOOR;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines received from a stream but not yet flushed to the buffer.
///
/// Appending to the buffer per message would trigger a redraw per message;
/// instead lines queue here and flush together on the batch tick.
#[derive(Debug, Clone, Default)]
pub struct PendingLines {
    queue: VecDeque<String>,
}

impl PendingLines {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one formatted line (newline included).
    pub fn push(&mut self, line: String) {
        self.queue.push_back(line);
    }

    /// Whether anything is waiting to flush.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Flush all queued lines into `buffer` as a single append, then trim to
    /// the stream cap. Returns `true` when anything was written (the caller
    /// schedules exactly one redraw for it).
    pub fn flush_into(&mut self, buffer: &mut OutputBuffer) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let batch: String = self.queue.drain(..).collect();
        buffer.append(&batch);
        buffer.trim_to(MAX_STREAM_BUFFER_CHARS);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_to_cap() {
        let mut backoff = Backoff::new();
        let seconds: Vec<u64> = (0..6).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(seconds, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn backoff_resets_to_floor_on_success() {
        let mut backoff = Backoff::new();
        for _ in 0..5 {
            let _ = backoff.next_delay();
        }
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn flush_concatenates_queued_lines_once() {
        let mut pending = PendingLines::new();
        let mut buffer = OutputBuffer::new();

        assert!(!pending.flush_into(&mut buffer));

        pending.push("a\n".to_string());
        pending.push("b\n".to_string());
        assert!(pending.flush_into(&mut buffer));
        assert_eq!(buffer.text(), "a\nb\n");
        assert!(pending.is_empty());
    }

    #[test]
    fn flush_enforces_buffer_cap_at_line_boundary() {
        let mut pending = PendingLines::new();
        let mut buffer = OutputBuffer::new();

        let long_line = format!("{}\n", "x".repeat(300_000));
        pending.push(long_line.clone());
        pending.push(long_line);
        pending.push("tail\n".to_string());
        pending.flush_into(&mut buffer);

        assert!(buffer.text().len() <= MAX_STREAM_BUFFER_CHARS);
        assert!(buffer.text().ends_with("tail\n"));
        assert!(buffer.text().starts_with('x'));
    }

    #[test]
    fn connection_state_labels() {
        assert_eq!(ConnectionState::Connected.label(), "Connected");
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Reconnecting.is_connected());
    }
}
