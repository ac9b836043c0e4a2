//! Text table rendering.
//!
//! Two flavors: [`TextTable`] renders one-shot command output as bordered
//! plain text into the output buffer, and [`layout_log_table`] computes the
//! width-fitted, word-wrapped layout the log view draws from.

use std::collections::BTreeSet;

use luxlink_client::LogEntry;

use crate::format::{fit_with_ellipsis, table_timestamp, word_wrap};

/// Fixed width of the timestamp column.
const TIMESTAMP_WIDTH: usize = 15;

/// Fixed width of the level column.
const LEVEL_WIDTH: usize = 8;

/// Narrowest a flexible column may get.
const MIN_COLUMN_WIDTH: usize = 4;

/// A bordered plain-text table for command output.
#[derive(Debug, Clone)]
pub struct TextTable {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Table with the given column headers.
    pub fn new(headers: &[&str]) -> Self {
        Self {
            title: None,
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a centered title above the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append one row; missing cells render empty.
    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render to bordered text no wider than `max_width` columns.
    pub fn render(&self, max_width: usize) -> String {
        let columns = self.headers.len().max(1);
        let mut widths: Vec<usize> = (0..columns)
            .map(|i| {
                let header = self.headers.get(i).map_or(0, |h| h.chars().count());
                let data = self
                    .rows
                    .iter()
                    .map(|row| row.get(i).map_or(0, |c| c.chars().count()))
                    .max()
                    .unwrap_or(0);
                header.max(data).max(1)
            })
            .collect();
        shrink_to_fit(&mut widths, max_width);

        let mut out = String::new();
        if let Some(title) = &self.title {
            let total: usize = widths.iter().sum::<usize>() + 3 * widths.len() + 1;
            let pad = total.saturating_sub(title.chars().count()) / 2;
            out.push_str(&" ".repeat(pad));
            out.push_str(title);
            out.push('\n');
        }

        out.push_str(&border(&widths, '┌', '┬', '┐'));
        out.push_str(&data_line(&widths, &self.headers));
        out.push_str(&border(&widths, '├', '┼', '┤'));
        for row in &self.rows {
            out.push_str(&data_line(&widths, row));
        }
        out.push_str(&border(&widths, '└', '┴', '┘'));
        out
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let mut line = String::new();
    line.push(left);
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push(mid);
        }
        line.push_str(&"─".repeat(width + 2));
    }
    line.push(right);
    line.push('\n');
    line
}

fn data_line(widths: &[usize], cells: &[String]) -> String {
    let mut line = String::new();
    line.push('│');
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push('│');
        }
        let cell = cells.get(i).map_or("", String::as_str);
        let fitted = fit_with_ellipsis(cell, *width);
        let pad = width.saturating_sub(fitted.chars().count());
        line.push(' ');
        line.push_str(&fitted);
        line.push_str(&" ".repeat(pad + 1));
    }
    line.push('│');
    line.push('\n');
    line
}

/// Shrink the widest columns until the rendered table fits `max_width`.
fn shrink_to_fit(widths: &mut [usize], max_width: usize) {
    let overhead = 3 * widths.len() + 1;
    loop {
        let total: usize = widths.iter().sum::<usize>() + overhead;
        if total <= max_width {
            return;
        }
        let Some(widest) = widths
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > MIN_COLUMN_WIDTH)
            .max_by_key(|(_, w)| **w)
            .map(|(i, _)| i)
        else {
            return;
        };
        widths[widest] -= 1;
    }
}

/// One laid-out log entry: wrapped lines per column, plus the raw level for
/// styling.
#[derive(Debug, Clone)]
pub struct LogRow {
    /// `cells[column]` is the list of wrapped sub-row lines for that column.
    pub cells: Vec<Vec<String>>,
    /// Level string of the entry (colors the level column).
    pub level: String,
    /// Sub-row count (max wrapped height across columns).
    pub height: usize,
}

/// Width-fitted layout of one page of log entries.
#[derive(Debug, Clone)]
pub struct LogTableLayout {
    /// Column headers: the four standard ones plus the sorted union of extra
    /// keys present on this page.
    pub columns: Vec<String>,
    /// Column widths in characters.
    pub widths: Vec<usize>,
    /// Laid-out entries, truncated to the available height.
    pub rows: Vec<LogRow>,
    /// Whether entries were dropped because the frame is full. Expected
    /// whenever a page holds more wrapped content than fits; not an error.
    pub truncated: bool,
}

/// Compute the log view table layout for a `width`-column terminal with
/// `max_rows` data sub-rows available.
pub fn layout_log_table(entries: &[LogEntry], width: usize, max_rows: usize) -> LogTableLayout {
    // The extra-key union is recomputed per page, so columns can shift when
    // new keys appear between refreshes.
    let extra_keys: BTreeSet<&str> =
        entries.iter().flat_map(|e| e.extra.keys().map(String::as_str)).collect();

    let mut columns = vec![
        "Timestamp".to_string(),
        "Level".to_string(),
        "Logger".to_string(),
        "Message".to_string(),
    ];
    columns.extend(extra_keys.iter().map(|k| title_case(k)));

    let widths = column_widths(width, extra_keys.len());

    let mut rows = Vec::new();
    let mut used_rows = 0usize;
    let mut truncated = false;
    for entry in entries {
        let mut cells = Vec::with_capacity(columns.len());
        cells.push(word_wrap(&table_timestamp(&entry.timestamp), widths[0]));
        cells.push(word_wrap(&entry.level, widths[1]));
        cells.push(word_wrap(&entry.logger, widths[2]));
        cells.push(word_wrap(&entry.message, widths[3]));
        for (i, key) in extra_keys.iter().enumerate() {
            let value = entry
                .extra
                .get(*key)
                .map(LogEntry::extra_display)
                .unwrap_or_default();
            cells.push(word_wrap(&value, widths[4 + i]));
        }

        let height = cells.iter().map(Vec::len).max().unwrap_or(1);
        if used_rows + height > max_rows {
            truncated = true;
            break;
        }
        used_rows += height;
        rows.push(LogRow { cells, level: entry.level.clone(), height });
    }

    LogTableLayout { columns, widths, rows, truncated }
}

/// Distribute `width` across the standard columns plus `extra` extra columns.
fn column_widths(width: usize, extra: usize) -> Vec<usize> {
    let columns = 4 + extra;
    let overhead = 3 * columns + 1;
    let flexible = width.saturating_sub(TIMESTAMP_WIDTH + LEVEL_WIDTH + overhead);

    let logger = (flexible / 5).clamp(MIN_COLUMN_WIDTH, 24);
    let per_extra = if extra == 0 {
        0
    } else {
        (flexible.saturating_sub(logger) / (extra + 2)).clamp(MIN_COLUMN_WIDTH, 20)
    };
    let message = flexible.saturating_sub(logger + per_extra * extra).max(MIN_COLUMN_WIDTH);

    let mut widths = vec![TIMESTAMP_WIDTH, LEVEL_WIDTH, logger, message];
    widths.extend(std::iter::repeat_n(per_extra, extra));
    widths
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: "2025-01-15T14:35:42Z".to_string(),
            level: "INFO".to_string(),
            logger: "artnet".to_string(),
            message: message.to_string(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn text_table_renders_borders_and_rows() {
        let mut table = TextTable::new(&["ID", "Status"]);
        table.push_row(vec!["AA:BB".to_string(), "Online".to_string()]);
        let rendered = table.render(40);

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('┌'));
        assert!(lines[1].contains("ID"));
        assert!(lines[2].contains("AA:BB"));
        assert!(lines[3].starts_with('└'));
    }

    #[test]
    fn text_table_shrinks_to_width() {
        let mut table = TextTable::new(&["Name", "Description"]);
        table.push_row(vec!["x".repeat(40), "y".repeat(60)]);
        let rendered = table.render(50);
        for line in rendered.lines() {
            assert!(line.chars().count() <= 50, "line too wide: {line}");
        }
        assert!(rendered.contains('…'));
    }

    #[test]
    fn log_layout_collects_sorted_extra_columns() {
        let mut first = entry("a");
        first.extra.insert("universe".to_string(), serde_json::json!(1));
        let mut second = entry("b");
        second.extra.insert("device_id".to_string(), serde_json::json!("AA"));

        let layout = layout_log_table(&[first, second], 120, 50);
        assert_eq!(layout.columns[4..], ["Device_id".to_string(), "Universe".to_string()]);
        // Entry without the key renders an empty cell, not a missing one.
        assert_eq!(layout.rows[0].cells.len(), 6);
    }

    #[test]
    fn log_layout_wraps_long_messages() {
        let long = entry(&"word ".repeat(60));
        let layout = layout_log_table(&[long], 80, 100);
        assert!(layout.rows[0].height > 1);
        for (cell, width) in layout.rows[0].cells.iter().zip(&layout.widths) {
            for line in cell {
                assert!(line.chars().count() <= *width);
            }
        }
    }

    #[test]
    fn log_layout_stops_at_available_height() {
        let entries: Vec<LogEntry> = (0..20).map(|i| entry(&format!("m{i}"))).collect();
        let layout = layout_log_table(&entries, 100, 10);
        assert!(layout.truncated);
        assert_eq!(layout.rows.len(), 10);
    }

    #[test]
    fn single_row_single_page() {
        let layout = layout_log_table(&[entry("only")], 100, 50);
        assert!(!layout.truncated);
        assert_eq!(layout.rows.len(), 1);
    }
}
