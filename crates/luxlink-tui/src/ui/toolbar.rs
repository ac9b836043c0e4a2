//! Toolbar rendering.
//!
//! Maps the pure toolbar fragments onto ratatui styles: a dim rule, then the
//! two status lines, each truncated to the terminal width.

use std::time::Instant;

use luxlink_app::{
    ShellState,
    toolbar::{self, Fragment, ToolbarTag},
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::Paragraph,
};

fn tag_style(tag: ToolbarTag) -> Style {
    match tag {
        ToolbarTag::Info => Style::default().fg(Color::Gray),
        ToolbarTag::Good => Style::default().fg(Color::Green),
        ToolbarTag::Degraded => Style::default().fg(Color::Yellow),
        ToolbarTag::Bad => Style::default().fg(Color::Red),
        ToolbarTag::Attention => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

fn to_line(fragments: Vec<Fragment>) -> Line<'static> {
    Line::from(
        fragments
            .into_iter()
            .map(|(tag, text)| Span::styled(text, tag_style(tag)))
            .collect::<Vec<_>>(),
    )
}

/// Render the toolbar into `area`.
pub fn render(frame: &mut Frame, shell: &ShellState, area: Rect) {
    let width = usize::from(area.width);
    let now = Instant::now();

    // Log tail and events modes surface their own connection state on line 1
    // as the events-stream slot; normal mode has no stream to report.
    let events_state = match &shell.mode {
        luxlink_app::ShellMode::Events(events) => Some(events.connection),
        _ => None,
    };

    let line1 = toolbar::fit_line(toolbar::line1(true, events_state, &shell.toolbar), width);
    let line2 = toolbar::fit_line(
        toolbar::line2(&shell.mode, &shell.toolbar, &shell.server_url, now),
        width,
    );

    let rule = Line::from(Span::styled("─".repeat(width), Style::default().fg(Color::DarkGray)));
    let text = Text::from(vec![rule, to_line(line1), to_line(line2)]);
    frame.render_widget(Paragraph::new(text), area);
}
