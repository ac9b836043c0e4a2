//! UI rendering.
//!
//! Rendering functions that convert shell state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and a
//! target area.

mod logview;
mod output;
mod prompt;
mod toolbar;

use luxlink_app::{ShellMode, ShellState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::input::InputState;

/// Height of the prompt area (bordered input line).
const INPUT_HEIGHT: u16 = 3;

/// Height of the toolbar (border rule plus two status lines).
const TOOLBAR_HEIGHT: u16 = 3;

/// Render the entire UI.
pub fn render(frame: &mut Frame, shell: &ShellState, input: &InputState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(TOOLBAR_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, toolbar_area] = chunks.as_ref() else {
        return;
    };

    match &shell.mode {
        ShellMode::Normal => output::render(frame, &shell.output, *main_area),
        ShellMode::LogTail(tail) => output::render(frame, &tail.buffer, *main_area),
        ShellMode::Events(events) => output::render(frame, &events.buffer, *main_area),
        ShellMode::Watch(watch) => output::render(frame, &watch.buffer, *main_area),
        ShellMode::LogView(view) => logview::render(frame, view, *main_area),
    }

    prompt::render(frame, shell, input, *input_area);
    toolbar::render(frame, shell, *toolbar_area);
}
