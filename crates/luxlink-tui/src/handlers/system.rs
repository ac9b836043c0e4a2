//! System command handlers: health, status, reload, profiles, help.

use luxlink_client::{BridgeClient, ClientError};
use luxlink_config::ConsoleConfig;

/// `health`.
pub async fn render_health(client: &BridgeClient) -> Result<String, ClientError> {
    let health = client.health().await?;
    let mut out = format!("Health: {}\n", health.status);
    for (name, subsystem) in &health.subsystems {
        out.push_str(&format!("  {name:<14} {}\n", subsystem.status.to_ascii_uppercase()));
    }
    Ok(out)
}

/// `reload`.
pub async fn render_reload(client: &BridgeClient) -> Result<String, ClientError> {
    let response = client.reload().await?;
    Ok(format!("Reload requested\n{}", super::render_value(&response, 1)))
}

/// `profile list`: configured profiles with the active one marked.
pub fn render_profiles(config: &ConsoleConfig) -> String {
    let mut out = String::from("Profiles:\n");
    for (key, profile) in &config.servers {
        let marker = if *key == config.active_server { "*" } else { " " };
        out.push_str(&format!("  {marker} {key:<12} {} ({})\n", profile.url, profile.name));
    }
    out
}

/// `help [topic]`.
pub fn help_text(topic: Option<&str>) -> String {
    match topic {
        Some("logs") => "\
logs view [--level L] [--logger NAME]     paginated log browser
logs tail [--level L] [--logger NAME]     live log stream
logs search PATTERN [--regex] [...]       search logs (one page of results)
logs events [--type device|mapping|health] live event stream

Inside the log view:
  PgUp/PgDn/Home/End  navigate pages      l  cycle level filter
  f  logger filter    /  search pattern   c  clear logger filter
  r  refresh          Space  follow mode  ?  help     q/Esc  exit
"
        .to_string(),
        Some("watch") => "\
watch devices|mappings|dashboard|logs [SECONDS]
  Re-renders the target every interval (floor 0.5s).
  +/- adjust the interval, q/Esc exits.
"
        .to_string(),
        Some("devices") => "\
devices list                 table of all devices
devices show ID              full device detail
devices enable|disable ID    toggle output to a device
devices test ID [JSON]       send a test payload
devices command ID JSON      send a raw command
"
        .to_string(),
        _ => "\
Commands:
  health | status | reload          bridge probes and config reload
  devices ...                       device table and actions (help devices)
  mappings list|show|delete         channel mappings
  channels list [universe...]       per-channel assignment table
  monitor dashboard|devices|stats   monitoring snapshots
  logs view|tail|search|events      log browsing and streaming (help logs)
  watch TARGET [SECONDS]            periodic refresh overlay (help watch)
  profile list|use NAME             switch server profiles
  clear | exit | quit

Keys: Ctrl-L clear output, Ctrl-T toggle follow, PgUp/PgDn scroll,
Ctrl-D exit.
"
        .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_listing_marks_active() {
        let config = ConsoleConfig::create_default();
        let out = render_profiles(&config);
        assert!(out.contains("* default"));
        assert!(out.contains("http://127.0.0.1:8000"));
    }

    #[test]
    fn help_has_topics() {
        assert!(help_text(None).contains("Commands:"));
        assert!(help_text(Some("logs")).contains("logs tail"));
        assert!(help_text(Some("unknown")).contains("Commands:"));
    }
}
