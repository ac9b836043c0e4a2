//! Normal-mode command parsing.
//!
//! Commands are a verb plus shell-style quoted arguments. Parsing is pure:
//! bad input produces an error message and no state change anywhere.

use std::{str::FromStr, time::Duration};

use thiserror::Error;

use crate::{events::EventKindFilter, format::LogLevel, watch::WatchTarget};

/// Command parse errors; the message is shown verbatim in the output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Blank line.
    #[error("empty command")]
    Empty,

    /// A quote was opened and never closed.
    #[error("unmatched quote in command line")]
    UnmatchedQuote,

    /// Verb not recognized.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// Recognized verb, unusable arguments.
    #[error("{0}")]
    Usage(String),
}

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `help [topic]`
    Help(Option<String>),
    /// `clear`
    Clear,
    /// `exit` / `quit`
    Exit,
    /// `health`
    Health,
    /// `status`
    Status,
    /// `reload`
    Reload,
    /// `devices list`
    DevicesList,
    /// `devices show ID`
    DeviceShow(String),
    /// `devices enable ID`
    DeviceEnable(String),
    /// `devices disable ID`
    DeviceDisable(String),
    /// `devices test ID [JSON]`
    DeviceTest(String, Option<String>),
    /// `devices command ID JSON`
    DeviceCommand(String, String),
    /// `mappings list`
    MappingsList,
    /// `mappings show ID`
    MappingShow(u64),
    /// `mappings delete ID`
    MappingDelete(u64),
    /// `channels list [universe...]`
    ChannelsList(Vec<u32>),
    /// `monitor dashboard`
    MonitorDashboard,
    /// `monitor devices`
    MonitorDevices,
    /// `monitor stats`
    MonitorStats,
    /// `logs view [--level L] [--logger NAME]`
    LogsView {
        /// Level filter; `None` shows everything.
        level: Option<LogLevel>,
        /// Logger prefix filter.
        logger: Option<String>,
    },
    /// `logs tail [--level L] [--logger NAME]`
    LogsTail {
        /// Level filter, passed through to the stream.
        level: Option<String>,
        /// Logger prefix filter.
        logger: Option<String>,
    },
    /// `logs search PATTERN [--regex] [--level L] [--logger NAME]`
    LogsSearch {
        /// Pattern to match.
        pattern: String,
        /// Whether the pattern is a regex.
        regex: bool,
        /// Level filter retained for the view state.
        level: Option<LogLevel>,
        /// Logger filter retained for the view state.
        logger: Option<String>,
    },
    /// `logs events [--type device|mapping|health]`
    LogsEvents(Option<EventKindFilter>),
    /// `watch TARGET [SECONDS]`
    Watch {
        /// What to watch.
        target: WatchTarget,
        /// Optional refresh interval.
        interval: Option<Duration>,
    },
    /// `profile list`
    ProfileList,
    /// `profile use NAME`
    ProfileUse(String),
}

/// Split a command line into words, honoring single/double quotes and
/// backslash escapes outside single quotes.
pub fn split_args(line: &str) -> Result<Vec<String>, CommandError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut has_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                } else {
                    current.push(c);
                }
            },
            Some(_) => {
                if c == '"' {
                    quote = None;
                } else if c == '\\' {
                    match chars.next() {
                        Some(escaped) => current.push(escaped),
                        None => return Err(CommandError::UnmatchedQuote),
                    }
                } else {
                    current.push(c);
                }
            },
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    has_word = true;
                },
                '\\' => match chars.next() {
                    Some(escaped) => {
                        current.push(escaped);
                        has_word = true;
                    },
                    None => return Err(CommandError::UnmatchedQuote),
                },
                c if c.is_whitespace() => {
                    if has_word {
                        words.push(std::mem::take(&mut current));
                        has_word = false;
                    }
                },
                c => {
                    current.push(c);
                    has_word = true;
                },
            },
        }
    }

    if quote.is_some() {
        return Err(CommandError::UnmatchedQuote);
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse one command line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let words = split_args(line)?;
    let Some((verb, args)) = words.split_first() else {
        return Err(CommandError::Empty);
    };

    match verb.as_str() {
        "help" | "?" => Ok(Command::Help(args.first().cloned())),
        "clear" => Ok(Command::Clear),
        "exit" | "quit" => Ok(Command::Exit),
        "health" => Ok(Command::Health),
        "status" => Ok(Command::Status),
        "reload" => Ok(Command::Reload),
        "devices" => parse_devices(args),
        "mappings" => parse_mappings(args),
        "channels" => parse_channels(args),
        "monitor" => parse_monitor(args),
        "logs" => parse_logs(args),
        "watch" => parse_watch(args),
        "profile" => parse_profile(args),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn parse_devices(args: &[String]) -> Result<Command, CommandError> {
    const USAGE: &str = "usage: devices list|show|enable|disable|test|command ...";
    match args.first().map(String::as_str) {
        Some("list") | None => Ok(Command::DevicesList),
        Some("show") => one_arg(args, "devices show ID").map(Command::DeviceShow),
        Some("enable") => one_arg(args, "devices enable ID").map(Command::DeviceEnable),
        Some("disable") => one_arg(args, "devices disable ID").map(Command::DeviceDisable),
        Some("test") => {
            let id = one_arg(args, "devices test ID [JSON]")?;
            Ok(Command::DeviceTest(id, args.get(2).cloned()))
        },
        Some("command") => {
            let (Some(id), Some(body)) = (args.get(1), args.get(2)) else {
                return Err(CommandError::Usage("usage: devices command ID JSON".to_string()));
            };
            Ok(Command::DeviceCommand(id.clone(), body.clone()))
        },
        Some(_) => Err(CommandError::Usage(USAGE.to_string())),
    }
}

fn parse_mappings(args: &[String]) -> Result<Command, CommandError> {
    match args.first().map(String::as_str) {
        Some("list") | None => Ok(Command::MappingsList),
        Some("show") => id_arg(args, "mappings show ID").map(Command::MappingShow),
        Some("delete") => id_arg(args, "mappings delete ID").map(Command::MappingDelete),
        Some(_) => Err(CommandError::Usage("usage: mappings list|show|delete ...".to_string())),
    }
}

fn parse_channels(args: &[String]) -> Result<Command, CommandError> {
    match args.first().map(String::as_str) {
        Some("list") => {
            let mut universes = Vec::new();
            for raw in &args[1..] {
                let universe = raw.parse::<u32>().map_err(|_| {
                    CommandError::Usage(format!("invalid universe number: {raw}"))
                })?;
                universes.push(universe);
            }
            if universes.is_empty() {
                universes.push(1);
            }
            Ok(Command::ChannelsList(universes))
        },
        _ => Err(CommandError::Usage("usage: channels list [universe...]".to_string())),
    }
}

fn parse_monitor(args: &[String]) -> Result<Command, CommandError> {
    match args.first().map(String::as_str) {
        Some("dashboard") => Ok(Command::MonitorDashboard),
        Some("devices") => Ok(Command::MonitorDevices),
        Some("stats") => Ok(Command::MonitorStats),
        _ => Err(CommandError::Usage("usage: monitor dashboard|devices|stats".to_string())),
    }
}

fn parse_logs(args: &[String]) -> Result<Command, CommandError> {
    const USAGE: &str = "usage: logs view|tail|events|search ...";
    match args.first().map(String::as_str) {
        Some("view") => {
            let (level, logger) = parse_log_filters(&args[1..], Some(LogLevel::Info))?;
            Ok(Command::LogsView { level, logger })
        },
        Some("tail") => {
            let (level, logger) = parse_log_filters(&args[1..], None)?;
            Ok(Command::LogsTail { level: level.map(|l| l.as_str().to_string()), logger })
        },
        Some("search") => {
            let Some(pattern) = args.get(1).filter(|p| !p.starts_with("--")) else {
                return Err(CommandError::Usage(
                    "usage: logs search PATTERN [--regex] [--level L] [--logger NAME]".to_string(),
                ));
            };
            let rest = &args[2..];
            let regex = rest.iter().any(|a| a == "--regex");
            let flags: Vec<String> = rest.iter().filter(|a| *a != "--regex").cloned().collect();
            let (level, logger) = parse_log_filters(&flags, Some(LogLevel::Info))?;
            Ok(Command::LogsSearch { pattern: pattern.clone(), regex, level, logger })
        },
        Some("events") => {
            let mut kind = None;
            let mut i = 1;
            while i < args.len() {
                if args[i] == "--type" {
                    let Some(raw) = args.get(i + 1) else {
                        return Err(CommandError::Usage("usage: logs events [--type TYPE]".to_string()));
                    };
                    kind = Some(EventKindFilter::from_str(raw).map_err(|()| {
                        CommandError::Usage(format!(
                            "invalid event type: {raw} (valid: device, mapping, health)"
                        ))
                    })?);
                    i += 1;
                }
                i += 1;
            }
            Ok(Command::LogsEvents(kind))
        },
        _ => Err(CommandError::Usage(USAGE.to_string())),
    }
}

/// Parse `--level` / `--logger` flags. `--level all` clears the default.
fn parse_log_filters(
    args: &[String],
    default_level: Option<LogLevel>,
) -> Result<(Option<LogLevel>, Option<String>), CommandError> {
    let mut level = default_level;
    let mut logger = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--level" => {
                let Some(raw) = args.get(i + 1) else {
                    return Err(CommandError::Usage("--level requires a value".to_string()));
                };
                if raw.eq_ignore_ascii_case("all") {
                    level = None;
                } else {
                    level = Some(LogLevel::from_str(raw).map_err(|()| {
                        CommandError::Usage(format!("invalid log level: {raw}"))
                    })?);
                }
                i += 1;
            },
            "--logger" => {
                let Some(raw) = args.get(i + 1) else {
                    return Err(CommandError::Usage("--logger requires a value".to_string()));
                };
                logger = Some(raw.clone());
                i += 1;
            },
            other => {
                return Err(CommandError::Usage(format!("unexpected argument: {other}")));
            },
        }
        i += 1;
    }
    Ok((level, logger))
}

fn parse_watch(args: &[String]) -> Result<Command, CommandError> {
    const USAGE: &str = "usage: watch devices|mappings|dashboard|logs [SECONDS]";
    let Some(raw_target) = args.first() else {
        return Err(CommandError::Usage(USAGE.to_string()));
    };
    let target = WatchTarget::from_str(raw_target)
        .map_err(|()| CommandError::Usage(USAGE.to_string()))?;
    let interval = match args.get(1) {
        Some(raw) => {
            let seconds = raw
                .parse::<f64>()
                .map_err(|_| CommandError::Usage(format!("invalid interval: {raw}")))?;
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(CommandError::Usage(format!("invalid interval: {raw}")));
            }
            Some(Duration::from_secs_f64(seconds))
        },
        None => None,
    };
    Ok(Command::Watch { target, interval })
}

fn parse_profile(args: &[String]) -> Result<Command, CommandError> {
    match args.first().map(String::as_str) {
        Some("list") | None => Ok(Command::ProfileList),
        Some("use") => one_arg(args, "profile use NAME").map(Command::ProfileUse),
        Some(_) => Err(CommandError::Usage("usage: profile list|use NAME".to_string())),
    }
}

fn one_arg(args: &[String], usage: &str) -> Result<String, CommandError> {
    args.get(1).cloned().ok_or_else(|| CommandError::Usage(format!("usage: {usage}")))
}

fn id_arg(args: &[String], usage: &str) -> Result<u64, CommandError> {
    let raw = one_arg(args, usage)?;
    raw.parse().map_err(|_| CommandError::Usage(format!("invalid id: {raw}")))
}
