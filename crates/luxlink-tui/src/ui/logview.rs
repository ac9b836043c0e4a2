//! Log view rendering: the paginated table and its modal overlays.

use luxlink_app::{
    table::{LogTableLayout, layout_log_table},
    view::{LogViewState, Modal, ModalKind},
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

/// Rows of table chrome inside the view (top border, header, separator,
/// bottom border).
const TABLE_CHROME_ROWS: u16 = 4;

fn level_style(level: &str) -> Style {
    match level {
        "DEBUG" => Style::default().fg(Color::Cyan),
        "INFO" => Style::default().fg(Color::Green),
        "WARNING" => Style::default().fg(Color::Yellow),
        "ERROR" => Style::default().fg(Color::Red),
        "CRITICAL" => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    }
}

fn border_line(widths: &[usize], left: &str, mid: &str, right: &str) -> Line<'static> {
    let mut text = String::from(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            text.push_str(mid);
        }
        text.push_str(&"─".repeat(width + 2));
    }
    text.push_str(right);
    Line::from(Span::styled(text, Style::default().fg(Color::Cyan)))
}

fn pad(text: &str, width: usize) -> String {
    let mut out = luxlink_app::format::fit_with_ellipsis(text, width);
    let used = out.chars().count();
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

fn header_line(layout: &LogTableLayout) -> Line<'static> {
    let sep = Style::default().fg(Color::Cyan);
    let mut spans = vec![Span::styled("│", sep)];
    for (title, width) in layout.columns.iter().zip(&layout.widths) {
        spans.push(Span::styled(
            format!(" {} ", pad(title, *width)),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled("│", sep));
    }
    Line::from(spans)
}

/// Render the log view into `area`.
pub fn render(frame: &mut Frame, view: &LogViewState, area: Rect) {
    if let Some(error) = &view.error {
        let text = Text::from(vec![
            Line::from(Span::styled(
                format!("Error loading logs: {error}"),
                Style::default().fg(Color::Red),
            )),
            Line::from(Span::styled(
                "Retrying on the next refresh...",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(Paragraph::new(text), area);
    } else if view.rows.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No logs found matching current filters",
                Style::default().fg(Color::DarkGray),
            )),
            area,
        );
    } else {
        render_table(frame, view, area);
    }

    if let Some(modal) = &view.modal {
        render_modal(frame, view, modal, area);
    }
}

fn render_table(frame: &mut Frame, view: &LogViewState, area: Rect) {
    let data_rows = usize::from(area.height.saturating_sub(TABLE_CHROME_ROWS).max(1));
    let layout = layout_log_table(&view.rows, usize::from(area.width), data_rows);

    let sep = Style::default().fg(Color::Cyan);
    let mut lines = Vec::new();
    lines.push(border_line(&layout.widths, "┌", "┬", "┐"));
    lines.push(header_line(&layout));
    lines.push(border_line(&layout.widths, "├", "┼", "┤"));

    for row in &layout.rows {
        for sub in 0..row.height {
            let mut spans = vec![Span::styled("│", sep)];
            for (index, (column, width)) in row.cells.iter().zip(&layout.widths).enumerate() {
                let cell = column.get(sub).map_or("", String::as_str);
                let style = if index == 1 { level_style(&row.level) } else { Style::default() };
                spans.push(Span::styled(format!(" {} ", pad(cell, *width)), style));
                spans.push(Span::styled("│", sep));
            }
            lines.push(Line::from(spans));
        }
    }

    lines.push(border_line(&layout.widths, "└", "┴", "┘"));
    if layout.truncated {
        lines.push(Line::from(Span::styled(
            "... more rows than fit on screen",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_modal(frame: &mut Frame, view: &LogViewState, modal: &Modal, area: Rect) {
    match modal.kind {
        ModalKind::Filter | ModalKind::Search => {
            let (title, description) = if modal.kind == ModalKind::Filter {
                ("Logger Filter", "Logger name prefix; empty clears the filter")
            } else {
                ("Search Pattern", "Pattern to search for; empty clears the search")
            };
            let popup = centered(area, 60, 7);
            frame.render_widget(Clear, popup);

            let mut lines = vec![
                Line::from(Span::styled(description, Style::default().fg(Color::Gray))),
                Line::from(format!("> {}", modal.input)),
                Line::default(),
            ];
            let footer = if modal.kind == ModalKind::Search {
                let regex = if view.search_regex { "ON" } else { "OFF" };
                format!("Enter: accept │ Esc: cancel │ Ctrl-R: regex ({regex})")
            } else {
                "Enter: accept │ Esc: cancel".to_string()
            };
            lines.push(Line::from(Span::styled(footer, Style::default().fg(Color::DarkGray))));

            let block = Block::default()
                .borders(Borders::ALL)
                .title(format!(" {title} "))
                .border_style(Style::default().fg(Color::Cyan));
            frame.render_widget(Paragraph::new(Text::from(lines)).block(block), popup);

            // Cursor inside the input line ("> " prefix, border offset 1).
            let cursor_x = popup.x + 3 + (modal.cursor as u16).min(popup.width.saturating_sub(5));
            frame.set_cursor_position((cursor_x, popup.y + 2));
        },
        ModalKind::Help => {
            let popup = centered(area, 62, 16);
            frame.render_widget(Clear, popup);
            let lines: Vec<Line> = [
                "Navigation:",
                "  PgUp/PgDn       previous/next page",
                "  Home/End        first/last page",
                "Filters:",
                "  l               cycle level (INFO→WARNING→ERROR→CRITICAL→ALL)",
                "  f               logger filter (prefix match)",
                "  /               edit search pattern",
                "  c               clear logger filter",
                "Actions:",
                "  r               refresh current page",
                "  Space           toggle follow mode",
                "  q/Esc           exit logs view",
                "",
                "Press any key to close",
            ]
            .iter()
            .map(|l| Line::from(*l))
            .collect();

            let block = Block::default()
                .borders(Borders::ALL)
                .title(" Logs View - Help ")
                .border_style(Style::default().fg(Color::Cyan));
            frame.render_widget(Paragraph::new(Text::from(lines)).block(block), popup);
        },
    }
}
