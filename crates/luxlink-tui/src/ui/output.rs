//! Scrollback rendering.
//!
//! Draws an [`OutputBuffer`] as an unwrapped paragraph, scrolled so the
//! cursor's line is visible — pinned to the newest line under follow-tail,
//! frozen wherever the reader scrolled to otherwise.

use luxlink_app::OutputBuffer;
use ratatui::{Frame, layout::Rect, widgets::Paragraph};

/// Render a buffer into `area`.
pub fn render(frame: &mut Frame, buffer: &OutputBuffer, area: Rect) {
    if area.height == 0 {
        return;
    }
    let visible = usize::from(area.height);
    let total = buffer.line_count();

    let scroll_top = if buffer.follow_tail() {
        total.saturating_sub(visible)
    } else {
        buffer
            .cursor_line()
            .saturating_sub(visible.saturating_sub(1))
            .min(total.saturating_sub(visible))
    };

    let scroll_top = scroll_top.min(usize::from(u16::MAX)) as u16;
    let paragraph = Paragraph::new(buffer.text()).scroll((scroll_top, 0));
    frame.render_widget(paragraph, area);
}
