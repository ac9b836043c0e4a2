//! Scrollback buffer for one display surface.
//!
//! Each full-screen surface (main output, log tail, events, watch overlay)
//! owns one buffer. Buffers are only ever touched from the event-loop task,
//! so no locking is involved; controller tasks hand text over as messages.

/// Append-only, size-bounded text buffer with a cursor.
///
/// Invariant: `0 <= cursor <= text.len()` after every operation. The cursor
/// marks the reader's position for scroll rendering; `follow_tail` keeps it
/// pinned to the end as text arrives.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    text: String,
    cursor: usize,
    follow_tail: bool,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Create an empty buffer with follow-tail enabled.
    pub fn new() -> Self {
        Self { text: String::new(), cursor: 0, follow_tail: true }
    }

    /// Buffer contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor offset into [`Self::text`].
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the cursor follows appended text.
    pub fn follow_tail(&self) -> bool {
        self.follow_tail
    }

    /// Enable or disable follow-tail. Enabling jumps the cursor to the end.
    pub fn set_follow_tail(&mut self, follow: bool) {
        self.follow_tail = follow;
        if follow {
            self.cursor = self.text.len();
        }
    }

    /// Append text. With follow-tail on the cursor moves to the end;
    /// otherwise it stays put (already within bounds since text only grew).
    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        if self.follow_tail {
            self.cursor = self.text.len();
        }
    }

    /// Replace the whole contents, clamping the requested cursor.
    pub fn set(&mut self, text: String, cursor: usize) {
        self.cursor = cursor.min(text.len());
        self.text = text;
    }

    /// Clear contents and reset the cursor.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Drop a whole-line prefix so the buffer holds at most `max_chars`.
    ///
    /// The cut happens at the first newline at or after `len - max_chars`;
    /// a line is never split. If the overflow sits inside one unterminated
    /// line, nothing is trimmed.
    pub fn trim_to(&mut self, max_chars: usize) {
        if self.text.len() <= max_chars {
            return;
        }
        let cut_start = self.text.len() - max_chars;
        let Some(newline) = self.text[cut_start..].find('\n') else {
            return;
        };
        let removed = cut_start + newline + 1;
        self.text.drain(..removed);
        self.cursor = self.cursor.saturating_sub(removed).min(self.text.len());
    }

    /// Move the cursor back by up to `chars` characters, snapping to the
    /// start of the line it lands in.
    pub fn scroll_up(&mut self, chars: usize) {
        let target = self.cursor.saturating_sub(chars);
        self.cursor = line_start(&self.text, target);
    }

    /// Move the cursor forward by up to `chars` characters. Returns `true`
    /// when the cursor ends near the tail (within `margin` characters).
    pub fn scroll_down(&mut self, chars: usize, margin: usize) -> bool {
        self.cursor = (self.cursor + chars).min(self.text.len());
        self.text.len() - self.cursor <= margin
    }

    /// Index of the line the cursor sits on.
    pub fn cursor_line(&self) -> usize {
        self.text[..self.cursor].matches('\n').count()
    }

    /// Total number of lines.
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() { 0 } else { self.text.matches('\n').count() + 1 }
    }
}

/// Byte offset of the start of the line containing `pos`.
///
/// `pos` must lie on a char boundary; callers only pass offsets derived from
/// existing cursor positions and saturating arithmetic on them.
fn line_start(text: &str, pos: usize) -> usize {
    let pos = floor_char_boundary(text, pos.min(text.len()));
    text[..pos].rfind('\n').map_or(0, |i| i + 1)
}

fn floor_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_with_follow_moves_cursor_to_end() {
        let mut buffer = OutputBuffer::new();
        buffer.append("one\n");
        buffer.append("two\n");
        assert_eq!(buffer.cursor(), buffer.text().len());
    }

    #[test]
    fn append_without_follow_preserves_cursor() {
        let mut buffer = OutputBuffer::new();
        buffer.append("one\ntwo\n");
        buffer.set_follow_tail(false);
        buffer.set("one\ntwo\n".to_string(), 4);
        buffer.append("three\n");
        assert_eq!(buffer.cursor(), 4);
    }

    #[test]
    fn set_clamps_cursor_to_length() {
        let mut buffer = OutputBuffer::new();
        buffer.set("abc".to_string(), 99);
        assert_eq!(buffer.cursor(), 3);
    }

    #[test]
    fn trim_cuts_at_line_boundary() {
        let mut buffer = OutputBuffer::new();
        buffer.append("aaaa\nbbbb\ncccc\n");
        buffer.trim_to(10);
        assert!(buffer.text().len() <= 10);
        assert_eq!(buffer.text(), "bbbb\ncccc\n");
    }

    #[test]
    fn trim_never_splits_an_unterminated_line() {
        let mut buffer = OutputBuffer::new();
        buffer.append("x".repeat(100).as_str());
        buffer.trim_to(10);
        // Single line longer than the cap: left whole rather than split.
        assert_eq!(buffer.text().len(), 100);
    }

    #[test]
    fn trim_adjusts_cursor_for_removed_prefix() {
        let mut buffer = OutputBuffer::new();
        buffer.append("aaaa\nbbbb\ncccc\n");
        buffer.set_follow_tail(false);
        buffer.set(buffer.text().to_string(), 7);
        buffer.trim_to(10);
        // 5 bytes removed; cursor shifts from 7 to 2, still in "bbbb" line.
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn scroll_up_snaps_to_line_start_and_down_reaches_tail() {
        let mut buffer = OutputBuffer::new();
        buffer.append("first\nsecond\nthird\n");
        buffer.scroll_up(8);
        assert_eq!(&buffer.text()[buffer.cursor()..buffer.cursor() + 6], "second");

        let at_tail = buffer.scroll_down(100, 0);
        assert!(at_tail);
        assert_eq!(buffer.cursor(), buffer.text().len());
    }

    #[test]
    fn enabling_follow_jumps_to_end() {
        let mut buffer = OutputBuffer::new();
        buffer.append("line\n");
        buffer.set_follow_tail(false);
        buffer.scroll_up(100);
        assert_eq!(buffer.cursor(), 0);
        buffer.set_follow_tail(true);
        assert_eq!(buffer.cursor(), buffer.text().len());
    }

    #[test]
    fn line_accounting() {
        let mut buffer = OutputBuffer::new();
        assert_eq!(buffer.line_count(), 0);
        buffer.append("a\nb\nc");
        assert_eq!(buffer.line_count(), 3);
        buffer.scroll_up(100);
        assert_eq!(buffer.cursor_line(), 0);
    }
}
