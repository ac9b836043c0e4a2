//! Prompt line rendering.
//!
//! Normal mode shows the editable command line with a live cursor; the
//! full-screen modes replace it with a key-hint line, since their keys are
//! scoped to the view.

use luxlink_app::{ShellMode, ShellState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::input::InputState;

const PROMPT_WIDTH: u16 = 3; // "> "
const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Render the prompt or mode-hint line.
pub fn render(frame: &mut Frame, shell: &ShellState, input: &InputState, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    match &shell.mode {
        ShellMode::Normal => {
            let text = format!("> {}", input.buffer());
            let paragraph =
                Paragraph::new(text).style(Style::default().fg(Color::White)).block(block);
            frame.render_widget(paragraph, area);

            let available = area.width.saturating_sub(PROMPT_WIDTH + RIGHT_PADDING);
            let offset = (input.cursor() as u16).min(available);
            let x = area.x.saturating_add(PROMPT_WIDTH).saturating_add(offset);
            let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);
            frame.set_cursor_position((x.min(max_x), area.y.saturating_add(INPUT_LINE_OFFSET_Y)));
        },
        mode => {
            let hint = match mode {
                ShellMode::LogView(_) => {
                    "PgUp/PgDn pages │ l level │ f filter │ / search │ ? help │ q exit"
                },
                ShellMode::LogTail(_) => {
                    "l: cycle level │ c: clear filters │ End: jump to tail │ q/Esc: exit"
                },
                ShellMode::Events(_) => "q/Esc: exit",
                ShellMode::Watch(_) => "+/-: adjust interval │ q/Esc: exit",
                ShellMode::Normal => "",
            };
            let paragraph =
                Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)).block(block);
            frame.render_widget(paragraph, area);
        },
    }
}
