//! Paginated log browser state.
//!
//! Pull-based counterpart to the live tail: pages are fetched on demand from
//! `/logs` (or, in search mode, `/logs/search`), with level/logger filters,
//! follow mode, a 5s auto-refresh, and modal text-entry sub-states for the
//! logger filter and the search pattern.
//!
//! Fetch results are matched against a generation counter so a response that
//! arrives after the filters already changed is dropped instead of clobbering
//! newer state.

use std::time::Duration;

use luxlink_client::LogEntry;

use crate::format::LogLevel;

/// Auto-refresh interval for the current page.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Rows reserved for chrome around the table (toolbar, input line, borders,
/// header).
const CHROME_ROWS: u16 = 10;

/// Smallest page size regardless of terminal height.
const MIN_PAGE_SIZE: usize = 10;

/// Page navigation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNav {
    /// Next page.
    Next,
    /// Previous page.
    Prev,
    /// First page.
    First,
    /// Last page.
    Last,
}

/// Cursor motion inside a modal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMotion {
    /// One character left.
    Left,
    /// One character right.
    Right,
    /// Start of input.
    Home,
    /// End of input.
    End,
}

/// Which modal is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    /// Logger filter editor.
    Filter,
    /// Search pattern editor.
    Search,
    /// Key binding help.
    Help,
}

/// An open modal overlay. Text entry mutates only this struct until the
/// modal is accepted.
#[derive(Debug, Clone)]
pub struct Modal {
    /// Modal variant.
    pub kind: ModalKind,
    /// Edited text.
    pub input: String,
    /// Cursor as a character index into `input`.
    pub cursor: usize,
}

/// What a fetch produced.
#[derive(Debug, Clone)]
pub enum FetchData {
    /// A page from `/logs`.
    Page {
        /// Entries for the requested page.
        logs: Vec<LogEntry>,
        /// Total entries matching the filters.
        total: usize,
    },
    /// Results from `/logs/search` (always one page).
    Search {
        /// Matching entries.
        logs: Vec<LogEntry>,
        /// Match count.
        count: usize,
    },
}

/// What to fetch next, derived from the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchQuery {
    /// Paginated fetch.
    Page {
        /// Level filter.
        level: Option<String>,
        /// Logger prefix filter.
        logger: Option<String>,
        /// Page size.
        limit: usize,
        /// Page offset in entries.
        offset: usize,
    },
    /// Search fetch.
    Search {
        /// Pattern to match.
        pattern: String,
        /// Whether the pattern is a regex.
        regex: bool,
        /// Result cap.
        limit: usize,
    },
}

/// State of the paginated log browser.
#[derive(Debug, Clone)]
pub struct LogViewState {
    /// Current page, 0-indexed. `< total_pages` unless `total_pages == 0`.
    pub current_page: usize,
    /// Total pages for the current filters.
    pub total_pages: usize,
    /// Entries per page.
    pub logs_per_page: usize,
    /// Total entries matching the current filters.
    pub total_logs: usize,
    /// Level filter; `None` shows all levels.
    pub level_filter: Option<LogLevel>,
    /// Logger name prefix filter.
    pub logger_filter: Option<String>,
    /// Search pattern; set switches the view to search mode (one page).
    pub search_pattern: Option<String>,
    /// Whether the search pattern is a regex.
    pub search_regex: bool,
    /// Follow mode: auto-refresh re-targets the last page.
    pub follow_mode: bool,
    /// Open modal, if any.
    pub modal: Option<Modal>,
    /// Last fetch error; displayed in place of the table.
    pub error: Option<String>,
    /// Entries of the current page.
    pub rows: Vec<LogEntry>,
    generation: u64,
    initial_fetch_done: bool,
}

impl LogViewState {
    /// Create view state with initial filters.
    pub fn new(
        level: Option<LogLevel>,
        logger: Option<String>,
        search: Option<(String, bool)>,
    ) -> Self {
        let (search_pattern, search_regex) = match search {
            Some((pattern, regex)) => (Some(pattern), regex),
            None => (None, false),
        };
        Self {
            current_page: 0,
            total_pages: 0,
            logs_per_page: 50,
            total_logs: 0,
            level_filter: level,
            logger_filter: logger,
            search_pattern,
            search_regex,
            follow_mode: false,
            modal: None,
            error: None,
            rows: Vec::new(),
            generation: 0,
            initial_fetch_done: false,
        }
    }

    /// Page size for a terminal of `terminal_rows` rows. Computed once at
    /// start and treated as fixed for the controller's lifetime.
    pub fn page_size_for(terminal_rows: u16) -> usize {
        usize::from(terminal_rows.saturating_sub(CHROME_ROWS)).max(MIN_PAGE_SIZE)
    }

    /// Whether search mode is active.
    pub fn is_search_mode(&self) -> bool {
        self.search_pattern.is_some()
    }

    /// Entry offset of the current page.
    pub fn offset(&self) -> usize {
        self.current_page * self.logs_per_page
    }

    /// Whether the current page is the last one.
    pub fn is_last_page(&self) -> bool {
        self.total_pages > 0 && self.current_page == self.total_pages - 1
    }

    /// Start a fetch: bumps the generation and returns it with the query to
    /// run. A result must be applied with the same generation or it is
    /// dropped as stale.
    pub fn begin_fetch(&mut self) -> (u64, FetchQuery) {
        self.generation += 1;
        let query = if let Some(pattern) = &self.search_pattern {
            FetchQuery::Search {
                pattern: pattern.clone(),
                regex: self.search_regex,
                limit: self.logs_per_page,
            }
        } else {
            FetchQuery::Page {
                level: self.level_filter.map(|l| l.as_str().to_string()),
                logger: self.logger_filter.clone(),
                limit: self.logs_per_page,
                offset: self.offset(),
            }
        };
        (self.generation, query)
    }

    /// Apply a fetch outcome. Returns `true` when the page index moved and
    /// the (now mismatched) page must be fetched again — the initial jump to
    /// the last page, a follow-mode re-target, or a clamp after the total
    /// shrank.
    pub fn apply_fetch(&mut self, generation: u64, outcome: Result<FetchData, String>) -> bool {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping stale fetch result");
            return false;
        }

        match outcome {
            Err(message) => {
                self.error = Some(message);
                self.rows.clear();
                self.total_pages = 0;
                self.total_logs = 0;
                self.initial_fetch_done = true;
                false
            },
            Ok(FetchData::Search { logs, count }) => {
                self.error = None;
                self.rows = logs;
                self.total_logs = count;
                self.total_pages = 1;
                self.current_page = 0;
                self.initial_fetch_done = true;
                false
            },
            Ok(FetchData::Page { logs, total }) => {
                self.error = None;
                self.rows = logs;
                self.total_logs = total;
                self.total_pages = total.div_ceil(self.logs_per_page.max(1));

                let first_fetch = !self.initial_fetch_done;
                self.initial_fetch_done = true;
                if self.total_pages == 0 {
                    self.current_page = 0;
                    return false;
                }
                let last = self.total_pages - 1;

                // Opening the view lands on the newest page; afterwards only
                // follow mode or a shrunken total moves the page.
                let target = if first_fetch || self.follow_mode {
                    last
                } else {
                    self.current_page.min(last)
                };
                if target != self.current_page {
                    self.current_page = target;
                    return true;
                }
                false
            },
        }
    }

    /// Navigate between pages. Leaving the last page drops follow mode.
    pub fn navigate(&mut self, nav: PageNav) {
        let last = self.total_pages.saturating_sub(1);
        self.current_page = match nav {
            PageNav::Next => (self.current_page + 1).min(last),
            PageNav::Prev => self.current_page.saturating_sub(1),
            PageNav::First => 0,
            PageNav::Last => last,
        };
        if self.follow_mode && !self.is_last_page() {
            self.follow_mode = false;
        }
    }

    /// Cycle the level filter: INFO → WARNING → ERROR → CRITICAL → ALL →
    /// INFO. Resets to the first page.
    pub fn cycle_level_filter(&mut self) {
        self.level_filter = match self.level_filter {
            Some(LogLevel::Info) => Some(LogLevel::Warning),
            Some(LogLevel::Warning) => Some(LogLevel::Error),
            Some(LogLevel::Error) => Some(LogLevel::Critical),
            Some(LogLevel::Critical) => None,
            None | Some(LogLevel::Debug) => Some(LogLevel::Info),
        };
        self.current_page = 0;
    }

    /// Set or clear the logger filter. Resets to the first page.
    pub fn set_logger_filter(&mut self, logger: Option<String>) {
        self.logger_filter = logger.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        self.current_page = 0;
    }

    /// Set or clear the search pattern. Resets to the first page.
    pub fn set_search_pattern(&mut self, pattern: Option<String>, regex: bool) {
        self.search_pattern = pattern.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        self.search_regex = regex;
        self.current_page = 0;
    }

    /// Toggle follow mode; enabling jumps to the last page.
    pub fn toggle_follow(&mut self) {
        self.follow_mode = !self.follow_mode;
        if self.follow_mode && self.total_pages > 0 {
            self.current_page = self.total_pages - 1;
        }
    }

    /// Open the logger-filter modal seeded with the current filter.
    pub fn show_filter_modal(&mut self) {
        let input = self.logger_filter.clone().unwrap_or_default();
        let cursor = input.chars().count();
        self.modal = Some(Modal { kind: ModalKind::Filter, input, cursor });
    }

    /// Open the search modal seeded with the current pattern.
    pub fn show_search_modal(&mut self) {
        let input = self.search_pattern.clone().unwrap_or_default();
        let cursor = input.chars().count();
        self.modal = Some(Modal { kind: ModalKind::Search, input, cursor });
    }

    /// Open the help modal.
    pub fn show_help_modal(&mut self) {
        self.modal = Some(Modal { kind: ModalKind::Help, input: String::new(), cursor: 0 });
    }

    /// Close the open modal. With `accept`, commits the edited value (and
    /// resets to page 0 via the setters). Returns `true` when a commit
    /// happened and the view must refetch.
    pub fn close_modal(&mut self, accept: bool) -> bool {
        let Some(modal) = self.modal.take() else {
            return false;
        };
        if !accept {
            return false;
        }
        match modal.kind {
            ModalKind::Filter => {
                self.set_logger_filter(Some(modal.input));
                true
            },
            ModalKind::Search => {
                self.set_search_pattern(Some(modal.input), self.search_regex);
                true
            },
            ModalKind::Help => false,
        }
    }

    /// Insert a character at the modal cursor.
    pub fn modal_insert(&mut self, c: char) {
        if let Some(modal) = &mut self.modal {
            let byte = char_to_byte(&modal.input, modal.cursor);
            modal.input.insert(byte, c);
            modal.cursor += 1;
        }
    }

    /// Delete the character before the modal cursor.
    pub fn modal_backspace(&mut self) {
        if let Some(modal) = &mut self.modal
            && modal.cursor > 0
        {
            modal.cursor -= 1;
            let byte = char_to_byte(&modal.input, modal.cursor);
            modal.input.remove(byte);
        }
    }

    /// Move the modal cursor.
    pub fn modal_move(&mut self, motion: ModalMotion) {
        if let Some(modal) = &mut self.modal {
            let len = modal.input.chars().count();
            modal.cursor = match motion {
                ModalMotion::Left => modal.cursor.saturating_sub(1),
                ModalMotion::Right => (modal.cursor + 1).min(len),
                ModalMotion::Home => 0,
                ModalMotion::End => len,
            };
        }
    }
}

/// Byte offset of the `char_index`-th character.
fn char_to_byte(s: &str, char_index: usize) -> usize {
    s.char_indices().nth(char_index).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entries(n: usize) -> Vec<LogEntry> {
        (0..n)
            .map(|i| LogEntry { message: format!("entry {i}"), ..LogEntry::default() })
            .collect()
    }

    fn page_result(n: usize, total: usize) -> Result<FetchData, String> {
        Ok(FetchData::Page { logs: entries(n), total })
    }

    #[test]
    fn pagination_math() {
        let mut view = LogViewState::new(Some(LogLevel::Info), None, None);
        view.logs_per_page = 50;
        view.current_page = 2;
        assert_eq!(view.offset(), 100);

        let (generation, _) = view.begin_fetch();
        view.apply_fetch(generation, page_result(23, 123));
        assert_eq!(view.total_pages, 3);
        assert!(view.is_last_page());
    }

    #[test]
    fn start_lands_on_last_page() {
        let mut view = LogViewState::new(Some(LogLevel::Info), None, None);
        view.logs_per_page = 50;

        let (generation, query) = view.begin_fetch();
        assert_eq!(
            query,
            FetchQuery::Page {
                level: Some("INFO".to_string()),
                logger: None,
                limit: 50,
                offset: 0
            }
        );

        let refetch = view.apply_fetch(generation, page_result(50, 123));
        assert!(refetch, "initial fetch must re-target the last page");
        assert_eq!(view.current_page, 2);
    }

    #[test]
    fn filter_changes_reset_page() {
        let mut view = LogViewState::new(Some(LogLevel::Info), None, None);
        view.total_pages = 5;
        view.current_page = 4;

        view.cycle_level_filter();
        assert_eq!(view.level_filter, Some(LogLevel::Warning));
        assert_eq!(view.current_page, 0);

        view.current_page = 3;
        view.set_logger_filter(Some("sender".to_string()));
        assert_eq!(view.current_page, 0);
    }

    #[test]
    fn level_cycle_covers_all_and_wraps() {
        let mut view = LogViewState::new(Some(LogLevel::Info), None, None);
        let mut seen = Vec::new();
        for _ in 0..5 {
            view.cycle_level_filter();
            seen.push(view.level_filter);
        }
        assert_eq!(seen, vec![
            Some(LogLevel::Warning),
            Some(LogLevel::Error),
            Some(LogLevel::Critical),
            None,
            Some(LogLevel::Info),
        ]);
    }

    #[test]
    fn search_mode_forces_single_page() {
        let mut view = LogViewState::new(None, None, Some(("timeout".to_string(), false)));
        let (generation, query) = view.begin_fetch();
        assert!(matches!(query, FetchQuery::Search { .. }));

        let refetch =
            view.apply_fetch(generation, Ok(FetchData::Search { logs: entries(7), count: 200 }));
        assert!(!refetch);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.current_page, 0);
        assert_eq!(view.total_logs, 200);
    }

    #[test]
    fn follow_mode_retargets_last_page_on_refresh() {
        let mut view = LogViewState::new(None, None, None);
        view.logs_per_page = 10;
        let (generation, _) = view.begin_fetch();
        view.apply_fetch(generation, page_result(10, 30));
        assert_eq!(view.current_page, 2);

        view.follow_mode = true;
        view.navigate(PageNav::First);
        // Navigating away from the last page drops follow.
        assert!(!view.follow_mode);

        view.toggle_follow();
        assert!(view.follow_mode);
        assert_eq!(view.current_page, 2);

        // Total grew; refresh under follow re-targets the new last page.
        let (generation, _) = view.begin_fetch();
        let refetch = view.apply_fetch(generation, page_result(10, 50));
        assert!(refetch);
        assert_eq!(view.current_page, 4);
    }

    #[test]
    fn shrunken_total_clamps_page() {
        let mut view = LogViewState::new(None, None, None);
        view.logs_per_page = 10;
        let (generation, _) = view.begin_fetch();
        view.apply_fetch(generation, page_result(10, 100));
        assert_eq!(view.current_page, 9);

        let (generation, _) = view.begin_fetch();
        let refetch = view.apply_fetch(generation, page_result(0, 25));
        assert!(refetch);
        assert_eq!(view.current_page, 2);
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut view = LogViewState::new(None, None, None);
        let (stale_generation, _) = view.begin_fetch();
        let (fresh_generation, _) = view.begin_fetch();

        view.apply_fetch(stale_generation, page_result(5, 5));
        assert!(view.rows.is_empty(), "stale result must not apply");

        view.apply_fetch(fresh_generation, page_result(5, 5));
        assert_eq!(view.rows.len(), 5);
    }

    #[test]
    fn fetch_error_clears_rows_and_recovers() {
        let mut view = LogViewState::new(None, None, None);
        let (generation, _) = view.begin_fetch();
        view.apply_fetch(generation, page_result(5, 5));

        let (generation, _) = view.begin_fetch();
        view.apply_fetch(generation, Err("connection refused".to_string()));
        assert!(view.rows.is_empty());
        assert_eq!(view.total_pages, 0);
        assert!(view.error.is_some());

        let (generation, _) = view.begin_fetch();
        view.apply_fetch(generation, page_result(5, 5));
        assert!(view.error.is_none());
        assert_eq!(view.rows.len(), 5);
    }

    #[test]
    fn modal_round_trip() {
        let mut view = LogViewState::new(None, Some("govee".to_string()), None);
        view.total_pages = 3;
        view.current_page = 2;

        view.show_filter_modal();
        {
            let modal = view.modal.as_ref().unwrap();
            assert_eq!(modal.input, "govee");
            assert_eq!(modal.cursor, 5);
        }

        view.modal_insert('x');
        let committed = view.close_modal(false);
        assert!(!committed);
        assert_eq!(view.logger_filter.as_deref(), Some("govee"));
        assert_eq!(view.current_page, 2, "cancel must not touch the page");

        view.show_filter_modal();
        view.modal_insert('x');
        let committed = view.close_modal(true);
        assert!(committed);
        assert_eq!(view.logger_filter.as_deref(), Some("goveex"));
        assert_eq!(view.current_page, 0);
    }

    #[test]
    fn modal_editing_motions() {
        let mut view = LogViewState::new(None, None, None);
        view.show_search_modal();
        for c in "abc".chars() {
            view.modal_insert(c);
        }
        view.modal_move(ModalMotion::Home);
        view.modal_insert('!');
        view.modal_move(ModalMotion::End);
        view.modal_backspace();
        assert_eq!(view.modal.as_ref().unwrap().input, "!ab");

        view.modal_move(ModalMotion::Left);
        view.modal_move(ModalMotion::Left);
        view.modal_backspace();
        assert_eq!(view.modal.as_ref().unwrap().input, "ab");
    }

    #[test]
    fn empty_modal_input_clears_filter() {
        let mut view = LogViewState::new(None, Some("api".to_string()), None);
        view.show_filter_modal();
        for _ in 0..3 {
            view.modal_backspace();
        }
        assert!(view.close_modal(true));
        assert!(view.logger_filter.is_none());
    }

    #[test]
    fn help_modal_commits_nothing() {
        let mut view = LogViewState::new(None, None, None);
        view.show_help_modal();
        assert!(!view.close_modal(true));
        assert!(view.modal.is_none());
    }

    #[test]
    fn page_size_respects_minimum() {
        assert_eq!(LogViewState::page_size_for(40), 30);
        assert_eq!(LogViewState::page_size_for(12), MIN_PAGE_SIZE);
    }
}
