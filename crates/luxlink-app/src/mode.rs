//! Display mode of the shell.
//!
//! Exactly one full-screen controller may be active at a time, so the mode
//! is a tagged union carrying that controller's owned state — independent
//! boolean flags would allow impossible combinations.

use crate::{events::EventsState, tail::LogTailState, view::LogViewState, watch::WatchState};

/// Active display mode, owning the active controller's state.
#[derive(Debug, Clone, Default)]
pub enum ShellMode {
    /// Line-oriented command shell with the main output buffer.
    #[default]
    Normal,
    /// Live log tail.
    LogTail(LogTailState),
    /// Paginated log browser.
    LogView(LogViewState),
    /// Periodic watch overlay.
    Watch(WatchState),
    /// Live event stream.
    Events(EventsState),
}

impl ShellMode {
    /// Short mode name for messages and the toolbar.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::LogTail(_) => "log tail",
            Self::LogView(_) => "logs view",
            Self::Watch(_) => "watch",
            Self::Events(_) => "events",
        }
    }

    /// Whether the command shell is active.
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// Mutable tail state when in log-tail mode.
    pub fn as_log_tail_mut(&mut self) -> Option<&mut LogTailState> {
        match self {
            Self::LogTail(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable view state when in log-view mode.
    pub fn as_log_view_mut(&mut self) -> Option<&mut LogViewState> {
        match self {
            Self::LogView(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable watch state when in watch mode.
    pub fn as_watch_mut(&mut self) -> Option<&mut WatchState> {
        match self {
            Self::Watch(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable events state when in events mode.
    pub fn as_events_mut(&mut self) -> Option<&mut EventsState> {
        match self {
            Self::Events(state) => Some(state),
            _ => None,
        }
    }
}
