//! Shared formatting helpers: log levels, timestamps, word wrapping.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

/// Log severity, ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Diagnostic chatter.
    Debug,
    /// Normal operation.
    Info,
    /// Something looks off.
    Warning,
    /// Operation failed.
    Error,
    /// The bridge is in trouble.
    Critical,
}

impl LogLevel {
    /// Wire/display name (upper case).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(()),
        }
    }
}

/// Compact table timestamp: `Jan 15 14:35:42`. Falls back to a prefix of the
/// raw string when it does not parse as ISO-8601.
pub fn table_timestamp(iso: &str) -> String {
    match DateTime::parse_from_rfc3339(iso) {
        Ok(dt) => dt.format("%b %d %H:%M:%S").to_string(),
        Err(_) => iso.chars().take(19).collect(),
    }
}

/// Relative age of an ISO-8601 timestamp: `5s ago`, `3m ago`, ... Returns
/// `-` when the timestamp is absent or unparseable, `now` for future stamps
/// (clock skew).
pub fn relative_age(iso: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(iso) = iso else {
        return "-".to_string();
    };
    let Ok(then) = DateTime::parse_from_rfc3339(iso) else {
        return "-".to_string();
    };
    let seconds = (now - then.with_timezone(&Utc)).num_seconds();
    if seconds < 0 {
        "now".to_string()
    } else if seconds < 60 {
        format!("{seconds}s ago")
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

/// Greedy word wrap to `width` columns. Words longer than the width are
/// broken hard. Always returns at least one (possibly empty) line.
pub fn word_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        loop {
            let sep = usize::from(!current.is_empty());
            if current.chars().count() + sep + word.chars().count() <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }
            if current.is_empty() {
                // Hard-break an overlong word.
                let head: String = word.chars().take(width).collect();
                let tail_start = head.len();
                lines.push(head);
                word = &word[tail_start..];
                if word.is_empty() {
                    break;
                }
            } else {
                lines.push(std::mem::take(&mut current));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Truncate to `width` characters, replacing the overflow with `…`.
pub fn fit_with_ellipsis(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}
