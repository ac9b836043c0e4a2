//! Command-line input state.
//!
//! Owns the prompt's text buffer, cursor, and command history. Key events
//! arrive already normalized as [`KeyInput`]; Enter hands the submitted line
//! back to the runtime for parsing.

use luxlink_app::KeyInput;

/// What a key did to the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Nothing changed.
    None,
    /// The line changed; redraw.
    Redraw,
    /// A command line was submitted.
    Submit(String),
}

/// Prompt state: text buffer, cursor, history.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    saved_line: String,
    history_limit: usize,
}

impl InputState {
    /// Empty input with the given history capacity.
    pub fn new(history_limit: usize) -> Self {
        Self { history_limit: history_limit.max(1), ..Self::default() }
    }

    /// Current line.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position (char index).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// History entries, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Seed history from a persisted file.
    pub fn load_history(&mut self, lines: impl IntoIterator<Item = String>) {
        self.history = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
        self.trim_history();
    }

    /// Clear the line (Ctrl-C). Returns `true` when there was text to clear.
    pub fn clear_line(&mut self) -> bool {
        let had_text = !self.buffer.is_empty();
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        had_text
    }

    /// Handle one key.
    pub fn handle_key(&mut self, key: KeyInput) -> InputEvent {
        match key {
            KeyInput::Char(c) => {
                let byte = char_to_byte(&self.buffer, self.cursor);
                self.buffer.insert(byte, c);
                self.cursor += 1;
                InputEvent::Redraw
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte = char_to_byte(&self.buffer, self.cursor);
                    self.buffer.remove(byte);
                }
                InputEvent::Redraw
            },
            KeyInput::Delete => {
                if self.cursor < self.buffer.chars().count() {
                    let byte = char_to_byte(&self.buffer, self.cursor);
                    self.buffer.remove(byte);
                }
                InputEvent::Redraw
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                InputEvent::Redraw
            },
            KeyInput::Right => {
                self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
                InputEvent::Redraw
            },
            KeyInput::Home => {
                self.cursor = 0;
                InputEvent::Redraw
            },
            KeyInput::End => {
                self.cursor = self.buffer.chars().count();
                InputEvent::Redraw
            },
            KeyInput::Up => self.history_prev(),
            KeyInput::Down => self.history_next(),
            KeyInput::Enter => self.submit(),
            _ => InputEvent::None,
        }
    }

    fn submit(&mut self) -> InputEvent {
        let line = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        self.history_index = None;
        if line.trim().is_empty() {
            return InputEvent::Redraw;
        }
        if self.history.last() != Some(&line) {
            self.history.push(line.clone());
            self.trim_history();
        }
        InputEvent::Submit(line)
    }

    fn history_prev(&mut self) -> InputEvent {
        if self.history.is_empty() {
            return InputEvent::None;
        }
        let next_index = match self.history_index {
            None => {
                self.saved_line = self.buffer.clone();
                self.history.len() - 1
            },
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(next_index);
        self.buffer = self.history[next_index].clone();
        self.cursor = self.buffer.chars().count();
        InputEvent::Redraw
    }

    fn history_next(&mut self) -> InputEvent {
        let Some(index) = self.history_index else {
            return InputEvent::None;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.buffer = self.history[index + 1].clone();
        } else {
            self.history_index = None;
            self.buffer = std::mem::take(&mut self.saved_line);
        }
        self.cursor = self.buffer.chars().count();
        InputEvent::Redraw
    }

    fn trim_history(&mut self) {
        let limit = self.history_limit.max(1);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }
}

fn char_to_byte(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_line(input: &mut InputState, line: &str) {
        for c in line.chars() {
            input.handle_key(KeyInput::Char(c));
        }
    }

    #[test]
    fn typing_and_submit() {
        let mut input = InputState::new(100);
        type_line(&mut input, "health");
        assert_eq!(input.buffer(), "health");

        let event = input.handle_key(KeyInput::Enter);
        assert_eq!(event, InputEvent::Submit("health".to_string()));
        assert!(input.buffer().is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn blank_submit_is_not_recorded() {
        let mut input = InputState::new(100);
        type_line(&mut input, "   ");
        assert_eq!(input.handle_key(KeyInput::Enter), InputEvent::Redraw);
        assert!(input.history().is_empty());
    }

    #[test]
    fn cursor_editing_mid_line() {
        let mut input = InputState::new(100);
        type_line(&mut input, "stats");
        input.handle_key(KeyInput::Home);
        input.handle_key(KeyInput::Char('!'));
        assert_eq!(input.buffer(), "!stats");
        input.handle_key(KeyInput::Delete);
        assert_eq!(input.buffer(), "!tats");
        input.handle_key(KeyInput::Backspace);
        assert_eq!(input.buffer(), "tats");
    }

    #[test]
    fn history_navigation_round_trip() {
        let mut input = InputState::new(100);
        for line in ["health", "status", "devices list"] {
            type_line(&mut input, line);
            input.handle_key(KeyInput::Enter);
        }

        type_line(&mut input, "mon");
        input.handle_key(KeyInput::Up);
        assert_eq!(input.buffer(), "devices list");
        input.handle_key(KeyInput::Up);
        assert_eq!(input.buffer(), "status");
        input.handle_key(KeyInput::Down);
        assert_eq!(input.buffer(), "devices list");
        input.handle_key(KeyInput::Down);
        assert_eq!(input.buffer(), "mon", "leaving history restores the draft");
    }

    #[test]
    fn consecutive_duplicates_collapse_in_history() {
        let mut input = InputState::new(100);
        for _ in 0..3 {
            type_line(&mut input, "health");
            input.handle_key(KeyInput::Enter);
        }
        assert_eq!(input.history().len(), 1);
    }

    #[test]
    fn history_respects_limit() {
        let mut input = InputState::new(3);
        for i in 0..10 {
            type_line(&mut input, &format!("cmd{i}"));
            input.handle_key(KeyInput::Enter);
        }
        assert_eq!(input.history(), &["cmd7", "cmd8", "cmd9"]);
    }

    #[test]
    fn ctrl_c_clears_line() {
        let mut input = InputState::new(100);
        type_line(&mut input, "abc");
        assert!(input.clear_line());
        assert!(!input.clear_line());
        assert!(input.buffer().is_empty());
    }
}
