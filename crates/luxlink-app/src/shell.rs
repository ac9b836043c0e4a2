//! Shell state and mode-scoped key dispatch.
//!
//! Pure state machine in the same mold as the rest of this crate: key
//! events come in, [`ModeAction`]s come out, and the runtime executes them
//! (redraws, fetches, task control). No I/O happens here.

use std::time::Duration;

use crate::{
    buffer::OutputBuffer,
    mode::ShellMode,
    toolbar::ToolbarStatus,
    view::{ModalKind, ModalMotion, PageNav},
};

/// Terminal key events, already normalized by the terminal layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    /// Ctrl-modified character.
    Ctrl(char),
    /// Enter/Return.
    Enter,
    /// Backspace.
    Backspace,
    /// Delete.
    Delete,
    /// Tab.
    Tab,
    /// Escape.
    Esc,
    /// Left arrow.
    Left,
    /// Right arrow.
    Right,
    /// Up arrow.
    Up,
    /// Down arrow.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
}

/// Instructions for the runtime, produced by key handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeAction {
    /// Redraw the UI.
    Render,
    /// Stop the active controller and return to normal mode.
    ExitMode,
    /// The log view needs its current page (re)fetched.
    FetchPage,
    /// Forward a new refresh interval to the watch task.
    SetWatchInterval(Duration),
    /// Push updated tail filters to the stream task.
    UpdateTailFilters(serde_json::Value),
}

/// Shared shell state: the main output surface, the active mode, and the
/// toolbar snapshot. Owned by the event-loop task.
#[derive(Debug)]
pub struct ShellState {
    /// Main output buffer (normal mode scrollback).
    pub output: OutputBuffer,
    /// Active display mode with its controller state.
    pub mode: ShellMode,
    /// Toolbar status snapshot.
    pub toolbar: ToolbarStatus,
    /// Terminal dimensions (columns, rows).
    pub terminal_size: (u16, u16),
    /// Base URL of the connected bridge, for display.
    pub server_url: String,
}

impl ShellState {
    /// Create shell state for a bridge at `server_url`.
    pub fn new(server_url: String) -> Self {
        Self {
            output: OutputBuffer::new(),
            mode: ShellMode::Normal,
            toolbar: ToolbarStatus::new(),
            terminal_size: (80, 24),
            server_url,
        }
    }

    /// Terminal width in columns.
    pub fn width(&self) -> usize {
        usize::from(self.terminal_size.0)
    }

    /// Append text to the main output buffer, keeping it bounded.
    pub fn append_output(&mut self, text: &str) {
        self.output.append(text);
        self.output.trim_to(crate::stream::MAX_STREAM_BUFFER_CHARS);
    }

    /// Append an error line to the main output buffer.
    pub fn append_error(&mut self, message: &str) {
        self.append_output(&format!("Error: {message}\n"));
    }

    /// Scroll the main output by roughly one page. Scrolling up releases
    /// follow-tail; scrolling back to the bottom re-engages it.
    pub fn scroll_output(&mut self, up: bool) {
        let (cols, rows) = self.terminal_size;
        let page_chars = usize::from(rows.saturating_sub(4)) * usize::from(cols.max(20));
        if up {
            self.output.set_follow_tail(false);
            self.output.scroll_up(page_chars);
        } else if self.output.scroll_down(page_chars, 10) {
            self.output.set_follow_tail(true);
        }
    }

    /// Handle a key in the active full-screen mode. Normal-mode keys are the
    /// input line's business and never reach this.
    pub fn handle_mode_key(&mut self, key: KeyInput) -> Vec<ModeAction> {
        match &mut self.mode {
            ShellMode::Normal => vec![],
            ShellMode::LogView(_) => self.handle_log_view_key(key),
            ShellMode::LogTail(tail) => match key {
                KeyInput::Char('q') | KeyInput::Esc => vec![ModeAction::ExitMode],
                KeyInput::End => {
                    tail.buffer.set_follow_tail(true);
                    vec![ModeAction::Render]
                },
                KeyInput::Char('l') => {
                    let message = tail.cycle_level_filter();
                    vec![ModeAction::UpdateTailFilters(message), ModeAction::Render]
                },
                KeyInput::Char('c') => {
                    let message = tail.clear_filters();
                    vec![ModeAction::UpdateTailFilters(message), ModeAction::Render]
                },
                _ => vec![],
            },
            ShellMode::Events(events) => match key {
                KeyInput::Char('q') | KeyInput::Esc => vec![ModeAction::ExitMode],
                KeyInput::End => {
                    events.buffer.set_follow_tail(true);
                    vec![ModeAction::Render]
                },
                _ => vec![],
            },
            ShellMode::Watch(watch) => match key {
                KeyInput::Char('q') | KeyInput::Esc => vec![ModeAction::ExitMode],
                KeyInput::Char('+') => {
                    let interval = watch.faster();
                    vec![ModeAction::SetWatchInterval(interval), ModeAction::Render]
                },
                KeyInput::Char('-') => {
                    let interval = watch.slower();
                    vec![ModeAction::SetWatchInterval(interval), ModeAction::Render]
                },
                _ => vec![],
            },
        }
    }

    fn handle_log_view_key(&mut self, key: KeyInput) -> Vec<ModeAction> {
        let Some(view) = self.mode.as_log_view_mut() else {
            return vec![];
        };

        // An open modal captures every key.
        if let Some(kind) = view.modal.as_ref().map(|m| m.kind) {
            if kind == ModalKind::Help {
                view.close_modal(false);
                return vec![ModeAction::Render];
            }
            return match key {
                KeyInput::Enter => {
                    if view.close_modal(true) {
                        vec![ModeAction::FetchPage]
                    } else {
                        vec![ModeAction::Render]
                    }
                },
                KeyInput::Esc => {
                    view.close_modal(false);
                    vec![ModeAction::Render]
                },
                KeyInput::Ctrl('r') => {
                    view.search_regex = !view.search_regex;
                    vec![ModeAction::Render]
                },
                KeyInput::Backspace => {
                    view.modal_backspace();
                    vec![ModeAction::Render]
                },
                KeyInput::Left => {
                    view.modal_move(ModalMotion::Left);
                    vec![ModeAction::Render]
                },
                KeyInput::Right => {
                    view.modal_move(ModalMotion::Right);
                    vec![ModeAction::Render]
                },
                KeyInput::Home => {
                    view.modal_move(ModalMotion::Home);
                    vec![ModeAction::Render]
                },
                KeyInput::End => {
                    view.modal_move(ModalMotion::End);
                    vec![ModeAction::Render]
                },
                KeyInput::Char(c) => {
                    view.modal_insert(c);
                    vec![ModeAction::Render]
                },
                _ => vec![],
            };
        }

        match key {
            KeyInput::Char('q') | KeyInput::Esc => vec![ModeAction::ExitMode],
            KeyInput::PageUp => {
                view.navigate(PageNav::Prev);
                vec![ModeAction::FetchPage]
            },
            KeyInput::PageDown => {
                view.navigate(PageNav::Next);
                vec![ModeAction::FetchPage]
            },
            KeyInput::Home => {
                view.navigate(PageNav::First);
                vec![ModeAction::FetchPage]
            },
            KeyInput::End => {
                view.navigate(PageNav::Last);
                vec![ModeAction::FetchPage]
            },
            KeyInput::Char('l') => {
                view.cycle_level_filter();
                vec![ModeAction::FetchPage]
            },
            KeyInput::Char('c') => {
                view.set_logger_filter(None);
                vec![ModeAction::FetchPage]
            },
            KeyInput::Char('r') => vec![ModeAction::FetchPage],
            KeyInput::Char(' ') => {
                view.toggle_follow();
                vec![ModeAction::FetchPage]
            },
            KeyInput::Char('f') => {
                view.show_filter_modal();
                vec![ModeAction::Render]
            },
            KeyInput::Char('/') => {
                view.show_search_modal();
                vec![ModeAction::Render]
            },
            KeyInput::Char('?') => {
                view.show_help_modal();
                vec![ModeAction::Render]
            },
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::LogLevel,
        tail::LogTailState,
        view::LogViewState,
        watch::{WatchState, WatchTarget},
    };

    fn shell_in_log_view() -> ShellState {
        let mut shell = ShellState::new("http://bridge:8000".to_string());
        shell.mode = ShellMode::LogView(LogViewState::new(Some(LogLevel::Info), None, None));
        shell
    }

    #[test]
    fn q_exits_any_full_screen_mode() {
        let mut shell = shell_in_log_view();
        assert_eq!(shell.handle_mode_key(KeyInput::Char('q')), vec![ModeAction::ExitMode]);

        shell.mode = ShellMode::LogTail(LogTailState::new(None, None));
        assert_eq!(shell.handle_mode_key(KeyInput::Esc), vec![ModeAction::ExitMode]);

        shell.mode = ShellMode::Watch(WatchState::new(WatchTarget::Devices, None));
        assert_eq!(shell.handle_mode_key(KeyInput::Char('q')), vec![ModeAction::ExitMode]);
    }

    #[test]
    fn page_keys_navigate_and_refetch() {
        let mut shell = shell_in_log_view();
        if let ShellMode::LogView(view) = &mut shell.mode {
            view.total_pages = 5;
            view.current_page = 2;
        }
        assert_eq!(shell.handle_mode_key(KeyInput::PageDown), vec![ModeAction::FetchPage]);
        if let ShellMode::LogView(view) = &shell.mode {
            assert_eq!(view.current_page, 3);
        }
    }

    #[test]
    fn modal_captures_navigation_keys() {
        let mut shell = shell_in_log_view();
        if let ShellMode::LogView(view) = &mut shell.mode {
            view.total_pages = 5;
            view.current_page = 2;
            view.show_filter_modal();
        }

        // PageDown while a modal is open must not navigate.
        let actions = shell.handle_mode_key(KeyInput::PageDown);
        assert!(!actions.contains(&ModeAction::FetchPage));
        if let ShellMode::LogView(view) = &shell.mode {
            assert_eq!(view.current_page, 2);
        }
    }

    #[test]
    fn modal_text_entry_flow() {
        let mut shell = shell_in_log_view();
        shell.handle_mode_key(KeyInput::Char('f'));
        shell.handle_mode_key(KeyInput::Char('a'));
        shell.handle_mode_key(KeyInput::Char('p'));
        shell.handle_mode_key(KeyInput::Char('i'));
        let actions = shell.handle_mode_key(KeyInput::Enter);
        assert_eq!(actions, vec![ModeAction::FetchPage]);
        if let ShellMode::LogView(view) = &shell.mode {
            assert_eq!(view.logger_filter.as_deref(), Some("api"));
            assert!(view.modal.is_none());
        }
    }

    #[test]
    fn help_modal_closes_on_any_key() {
        let mut shell = shell_in_log_view();
        shell.handle_mode_key(KeyInput::Char('?'));
        let actions = shell.handle_mode_key(KeyInput::Char('x'));
        assert_eq!(actions, vec![ModeAction::Render]);
        if let ShellMode::LogView(view) = &shell.mode {
            assert!(view.modal.is_none());
        }
    }

    #[test]
    fn tail_filter_keys_emit_updates() {
        let mut shell = ShellState::new("http://x".to_string());
        shell.mode = ShellMode::LogTail(LogTailState::new(None, None));

        let actions = shell.handle_mode_key(KeyInput::Char('l'));
        assert_eq!(
            actions[0],
            ModeAction::UpdateTailFilters(serde_json::json!({"level": "INFO"}))
        );

        let actions = shell.handle_mode_key(KeyInput::Char('c'));
        assert_eq!(actions[0], ModeAction::UpdateTailFilters(serde_json::json!({})));
    }

    #[test]
    fn watch_keys_adjust_interval() {
        let mut shell = ShellState::new("http://x".to_string());
        shell.mode = ShellMode::Watch(WatchState::new(WatchTarget::Logs, None));
        let actions = shell.handle_mode_key(KeyInput::Char('-'));
        assert_eq!(actions[0], ModeAction::SetWatchInterval(Duration::from_millis(5500)));
    }

    #[test]
    fn output_scroll_releases_and_reengages_follow() {
        let mut shell = ShellState::new("http://x".to_string());
        for i in 0..200 {
            shell.append_output(&format!("line {i}\n"));
        }
        assert!(shell.output.follow_tail());

        shell.scroll_output(true);
        assert!(!shell.output.follow_tail());
        assert!(shell.output.cursor() < shell.output.text().len());

        loop {
            shell.scroll_output(false);
            if shell.output.follow_tail() {
                break;
            }
        }
        assert_eq!(shell.output.cursor(), shell.output.text().len());
    }

    #[test]
    fn watch_overlay_never_touches_main_output() {
        let mut shell = ShellState::new("http://x".to_string());
        shell.append_output("command output before watch\n");
        let before = shell.output.text().to_string();

        shell.mode = ShellMode::Watch(WatchState::new(WatchTarget::Devices, None));
        if let ShellMode::Watch(watch) = &mut shell.mode {
            watch.show("overlay content\n".to_string());
            watch.show("refreshed overlay\n".to_string());
        }

        assert_eq!(shell.output.text(), before);
    }

    #[test]
    fn normal_mode_ignores_mode_keys() {
        let mut shell = ShellState::new("http://x".to_string());
        assert!(shell.handle_mode_key(KeyInput::Char('q')).is_empty());
    }
}
